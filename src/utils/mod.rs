pub mod progress;
pub mod time_format;

pub use progress::{
    render_bar, ChannelProgress, NoopProgress, ProgressPhase, ProgressSink, ProgressUpdate,
    TerminalProgress,
};
