mod decoder;
mod ffmpeg_decode;
mod symphonia_decode;
mod wav_header;

pub use decoder::{DecodedPcm, FallbackAudioDecoder};
pub use ffmpeg_decode::ffmpeg_available;
