//! Thread-backed one-shot timer

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::SetupError;
use crate::host::work_loop::{Command, Dispatcher};
use crate::host::Scheduler;

enum TimerControl {
    Arm { at: Instant, generation: u64 },
    Cancel,
    Shutdown,
}

/// [`Scheduler`] that posts [`Command::Fire`] into a work loop
///
/// The timer thread is spawned by the first `arm` and joined on drop. Each
/// firing carries the generation it was armed under.
pub struct ThreadTimer {
    dispatcher: Dispatcher,
    epoch: Instant,
    generation: u64,
    control: Option<Sender<TimerControl>>,
    thread: Option<JoinHandle<()>>,
}

impl ThreadTimer {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            epoch: Instant::now(),
            generation: 0,
            control: None,
            thread: None,
        }
    }

    fn ensure_thread(&mut self) -> Result<&Sender<TimerControl>, SetupError> {
        if self.control.is_none() {
            let (tx, rx) = unbounded();
            let dispatcher = self.dispatcher.clone();
            let thread = thread::Builder::new()
                .name("reac-timer".to_string())
                .spawn(move || run(rx, dispatcher))
                .map_err(|e| SetupError::SchedulerUnavailable(e.to_string()))?;
            self.control = Some(tx);
            self.thread = Some(thread);
        }
        self.control
            .as_ref()
            .ok_or_else(|| SetupError::SchedulerUnavailable("timer thread missing".into()))
    }

    fn arm_message(&self, delay_nanos: u64) -> TimerControl {
        TimerControl::Arm {
            at: Instant::now() + Duration::from_nanos(delay_nanos),
            generation: self.generation,
        }
    }
}

impl Scheduler for ThreadTimer {
    fn arm(&mut self, delay_nanos: u64) -> Result<(), SetupError> {
        self.generation = self.generation.wrapping_add(1);
        let message = self.arm_message(delay_nanos);
        let control = self.ensure_thread()?;
        control
            .send(message)
            .map_err(|_| SetupError::SchedulerUnavailable("timer thread exited".into()))
    }

    fn rearm(&mut self, delay_nanos: u64) {
        let message = self.arm_message(delay_nanos);
        if let Some(control) = &self.control {
            if control.send(message).is_err() {
                tracing::warn!("Timer thread gone, dropping rearm");
            }
        }
    }

    fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(control) = &self.control {
            let _ = control.send(TimerControl::Cancel);
        }
    }

    fn now_nanos(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }

    fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for ThreadTimer {
    fn drop(&mut self) {
        if let Some(control) = self.control.take() {
            let _ = control.send(TimerControl::Shutdown);
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("Timer thread panicked");
            }
        }
    }
}

fn run(control: Receiver<TimerControl>, dispatcher: Dispatcher) {
    let mut deadline: Option<(Instant, u64)> = None;

    loop {
        let message = match deadline {
            Some((at, generation)) => match control.recv_deadline(at) {
                Ok(message) => message,
                Err(RecvTimeoutError::Timeout) => {
                    deadline = None;
                    if !dispatcher.send(Command::Fire(generation)) {
                        break;
                    }
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            },
            None => match control.recv() {
                Ok(message) => message,
                Err(_) => break,
            },
        };

        match message {
            TimerControl::Arm { at, generation } => deadline = Some((at, generation)),
            TimerControl::Cancel => deadline = None,
            TimerControl::Shutdown => break,
        }
    }
}
