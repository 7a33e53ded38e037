pub mod batch;
pub mod convert;
pub mod decode;
pub mod resize;

pub use batch::{run_batch, BatchProcessor, ExecutionMode};
pub use convert::{
    convert_directory, convert_one, ConversionOutcome, ConversionSummary, ConvertOptions,
};
pub use decode::{is_imagemagick_available, ImageCrateDecoder, ImageMagickDecoder, SourceDecoder};
pub use resize::{crop_and_resize, crop_to_aspect, orient_landscape, resize_image};
