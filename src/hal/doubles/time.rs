use crate::hal::time::CountDown;
use core::convert::Infallible;

/// Count down timer whose periods elapse instantly.
#[derive(Clone, Debug, Default)]
pub struct FakeCountDown {
    pub reload: Option<u32>,
    pub periods: u32,
    pub running: bool,
}

impl CountDown for FakeCountDown {
    fn start(&mut self, reload: u32) {
        self.reload = Some(reload);
        self.running = true;
    }

    fn wait(&mut self) -> nb::Result<(), Infallible> {
        self.periods += 1;
        Ok(())
    }

    fn stop(&mut self) { self.running = false; }
}
