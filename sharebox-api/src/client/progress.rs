use std::io::Read;

/// callback receiving the bytes sent so far and the total when known
pub type OnProgress = Box<dyn FnMut(u64, Option<u64>) + Send>;

/// wraps the reader handed to the transport and reports every chunk the
/// transport pulls out of it
pub struct ProgressRead<R> {
    inner: R,
    sent: u64,
    total: Option<u64>,
    on_progress: OnProgress,
}

impl<R> ProgressRead<R> {
    pub fn new(inner: R, total: Option<u64>, on_progress: OnProgress) -> Self {
        ProgressRead {
            inner,
            sent: 0,
            total,
            on_progress,
        }
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }
}

impl<R> Read for ProgressRead<R>
where
    R: Read
{
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let read = self.inner.read(buf)?;

        if read > 0 {
            self.sent += read as u64;

            (self.on_progress)(self.sent, self.total);
        }

        Ok(read)
    }
}
