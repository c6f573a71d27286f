mod doodstream;
mod gofile;
mod hexload;
mod mixdrop;
mod streamtape;
mod voe;

pub use doodstream::DoodStream;
pub use gofile::GoFile;
pub use hexload::Hexload;
pub use mixdrop::MixDrop;
pub use streamtape::Streamtape;
pub use voe::Voe;
