pub mod clock;
pub mod tts;

pub use clock::Clock;
pub use tts::TtsProvider;
