/// Square edge length expected by SqueezeNet-style ImageNet classifiers.
pub const DEFAULT_INPUT_SIZE: u32 = 224;
pub const DEFAULT_MEAN: f32 = 127.5;
pub const DEFAULT_STD: f32 = 1.0;
