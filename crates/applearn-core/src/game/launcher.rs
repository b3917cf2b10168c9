use std::io;

/// Opens a game URL in a separate, detached browsing context.
pub trait WindowOpener {
    /// An error means the window could not be opened (blocked popup).
    fn open_detached(&self, url: &str) -> io::Result<()>;
}

/// Default browser of the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl WindowOpener for SystemBrowser {
    fn open_detached(&self, url: &str) -> io::Result<()> {
        open::that_detached(url)
    }
}
