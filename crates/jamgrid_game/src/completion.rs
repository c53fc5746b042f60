use tokio::sync::oneshot;

/// Fires once when a tick-driven operation finishes.
///
/// Poll it with [`oneshot::Receiver::try_recv`] from the frame loop, or `.await` it.
/// An operation that is abandoned (cancelled, or removed before it started) drops its sender instead,
/// so the receiver reports closure and never success.
pub type Completion = oneshot::Receiver<()>;

/// The sending half of a [`Completion`], kept by the component that owns the operation.
#[derive(Debug)]
pub struct Completer(oneshot::Sender<()>);

impl Completer {
    pub fn new() -> (Self, Completion) {
        let (tx, rx) = oneshot::channel();

        (Self(tx), rx)
    }

    pub fn complete(self) {
        // the receiver may have been dropped, nobody is waiting then
        let _ = self.0.send(());
    }
}
