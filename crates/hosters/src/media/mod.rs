pub mod quality;
pub mod resolved_stream;

pub use quality::Quality;
pub use resolved_stream::ResolvedStream;
