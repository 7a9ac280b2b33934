use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{
    Data, Device, FromSample, Sample, SampleFormat, SampleRate, Stream, StreamConfig,
    SupportedStreamConfigRange,
};
use ringbuf::traits::{Consumer, Observer, Producer};
use ringbuf::{HeapCons, HeapProd};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wakecast_core::{AudioBlock, AudioError};

/// How often the capture loop checks for a complete block.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Blocking producer of fixed-size audio blocks.
pub trait AudioSource {
    /// Invoke `on_block` for every captured block until the source is closed
    /// (`Ok`) or the device fails (`Err`).
    fn run(&mut self, on_block: &mut dyn FnMut(AudioBlock)) -> Result<(), AudioError>;

    fn close_handle(&self) -> CloseHandle;
}

/// Cloneable flag that asks a running [`AudioSource`] to return.
#[derive(Clone, Default)]
pub struct CloseHandle {
    closed: Arc<AtomicBool>,
}

impl CloseHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::Relaxed);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }
}

/// Sample formats [`decode_samples`] converts, most preferred first.
pub const DECODABLE_FORMATS: [SampleFormat; 3] =
    [SampleFormat::I16, SampleFormat::F32, SampleFormat::U16];

/// One input configuration range a device advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatRange {
    pub format: SampleFormat,
    pub channels: u16,
    pub min_rate: u32,
    pub max_rate: u32,
}

impl From<&SupportedStreamConfigRange> for FormatRange {
    fn from(range: &SupportedStreamConfigRange) -> Self {
        Self {
            format: range.sample_format(),
            channels: range.channels(),
            min_rate: range.min_sample_rate().0,
            max_rate: range.max_sample_rate().0,
        }
    }
}

/// Pick the best decodable format among mono ranges covering `sample_rate`.
pub fn select_sample_format(
    ranges: &[FormatRange],
    sample_rate: u32,
) -> Result<SampleFormat, AudioError> {
    DECODABLE_FORMATS
        .iter()
        .copied()
        .find(|format| {
            ranges.iter().any(|r| {
                r.format == *format
                    && r.channels == 1
                    && (r.min_rate..=r.max_rate).contains(&sample_rate)
            })
        })
        .ok_or_else(|| {
            let offered: Vec<String> = ranges
                .iter()
                .map(|r| format!("{:?}x{}@{}-{}", r.format, r.channels, r.min_rate, r.max_rate))
                .collect();
            AudioError::UnsupportedFormat(format!(
                "no mono i16/f32/u16 input at {sample_rate} Hz (device offers [{}])",
                offered.join(", ")
            ))
        })
}

fn to_i16<T>(samples: &[T]) -> Vec<i16>
where
    T: Sample,
    i16: FromSample<T>,
{
    samples.iter().map(|&x| i16::from_sample_(x)).collect()
}

/// Decode a raw device buffer into mono i16 samples.
pub fn decode_samples(data: &Data) -> Result<Vec<i16>, AudioError> {
    let format = data.sample_format();
    let samples = match format {
        SampleFormat::I16 => data.as_slice::<i16>().map(|s| s.to_vec()),
        SampleFormat::F32 => data.as_slice::<f32>().map(to_i16),
        SampleFormat::U16 => data.as_slice::<u16>().map(to_i16),
        other => return Err(AudioError::UnsupportedFormat(format!("{other:?}"))),
    };
    samples.ok_or_else(|| AudioError::Conversion(format!("buffer does not hold {format:?} samples")))
}

/// Cuts a continuous sample stream into blocks of exactly `block_size`.
pub struct BlockAssembler {
    consumer: HeapCons<i16>,
    block_size: usize,
    sample_rate: u32,
}

impl BlockAssembler {
    pub fn new(consumer: HeapCons<i16>, block_size: usize, sample_rate: u32) -> Self {
        Self {
            consumer,
            block_size,
            sample_rate,
        }
    }

    /// Pop the next full block, or `None` if fewer than `block_size` samples
    /// are buffered.
    pub fn next_block(&mut self) -> Option<AudioBlock> {
        if self.consumer.occupied_len() < self.block_size {
            return None;
        }
        let mut samples = vec![0i16; self.block_size];
        let n = self.consumer.pop_slice(&mut samples);
        debug_assert_eq!(n, self.block_size);
        Some(AudioBlock::new(samples, self.sample_rate))
    }
}

/// Microphone capture bound to one cpal input stream.
///
/// The stream is released when this value is dropped. cpal streams are not
/// `Send` on every host, so open and run it on the same thread.
pub struct CaptureStream {
    _stream: Stream,
    assembler: BlockAssembler,
    closed: CloseHandle,
    failure: Arc<Mutex<Option<String>>>,
}

impl CaptureStream {
    pub fn open(device: &Device, sample_rate: u32, block_size: u32) -> Result<Self, AudioError> {
        let config = StreamConfig {
            channels: 1,
            sample_rate: SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };
        let ranges: Vec<FormatRange> = device
            .supported_input_configs()
            .map_err(|e| AudioError::StreamBuild(e.to_string()))?
            .map(|range| FormatRange::from(&range))
            .collect();
        let sample_format = select_sample_format(&ranges, sample_rate)?;

        // Room for a few blocks so a slow recognizer step does not drop audio.
        let (mut producer, consumer) = crate::create_ring_buffer(block_size as usize * 4);

        let failure = Arc::new(Mutex::new(None));
        let failure_slot = Arc::clone(&failure);
        let err_callback = move |err: cpal::StreamError| {
            tracing::error!("capture stream error: {}", err);
            if let Ok(mut slot) = failure_slot.lock() {
                slot.get_or_insert_with(|| err.to_string());
            }
        };

        let stream = device
            .build_input_stream_raw(
                &config,
                sample_format,
                move |data: &Data, _: &cpal::InputCallbackInfo| match decode_samples(data) {
                    Ok(samples) => push_samples(&mut producer, &samples),
                    Err(e) => tracing::warn!("skipping audio buffer: {}", e),
                },
                err_callback,
                None,
            )
            .map_err(|e| AudioError::StreamBuild(e.to_string()))?;
        stream
            .play()
            .map_err(|e| AudioError::StreamPlay(e.to_string()))?;

        tracing::debug!(sample_rate, block_size, ?sample_format, "capture stream opened");

        Ok(Self {
            _stream: stream,
            assembler: BlockAssembler::new(consumer, block_size as usize, sample_rate),
            closed: CloseHandle::new(),
            failure,
        })
    }

    fn take_failure(&self) -> Option<String> {
        self.failure.lock().ok().and_then(|mut slot| slot.take())
    }
}

fn push_samples(producer: &mut HeapProd<i16>, samples: &[i16]) {
    let pushed = producer.push_slice(samples);
    if pushed < samples.len() {
        tracing::warn!(dropped = samples.len() - pushed, "capture buffer full");
    }
}

impl AudioSource for CaptureStream {
    fn run(&mut self, on_block: &mut dyn FnMut(AudioBlock)) -> Result<(), AudioError> {
        loop {
            if self.closed.is_closed() {
                return Ok(());
            }
            if let Some(msg) = self.take_failure() {
                return Err(AudioError::StreamError(msg));
            }
            while let Some(block) = self.assembler.next_block() {
                on_block(block);
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    fn close_handle(&self) -> CloseHandle {
        self.closed.clone()
    }
}
