pub mod fft;
pub mod harmonics;
pub mod stats;
pub mod window;
