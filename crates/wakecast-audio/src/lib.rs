pub mod capture;
pub mod device;

pub use capture::{
    decode_samples, select_sample_format, AudioSource, BlockAssembler, CaptureStream, CloseHandle,
    FormatRange, DECODABLE_FORMATS,
};
pub use device::DeviceManager;

use ringbuf::traits::Split;
use ringbuf::{HeapCons, HeapProd, HeapRb};

/// Create a ring buffer split into producer and consumer halves.
pub fn create_ring_buffer(capacity: usize) -> (HeapProd<i16>, HeapCons<i16>) {
    HeapRb::<i16>::new(capacity).split()
}
