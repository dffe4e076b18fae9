pub mod effect;
pub mod filter;
pub mod gain;
pub mod mixer;

pub use effect::{AudioEffect, EffectNode};
pub use filter::LowPass;
pub use gain::Gain;
pub use mixer::Mixer;
