use std::{
    ops::{Deref, DerefMut},
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, RecvTimeoutError},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{info, warn};

use crate::{
    recording::SampleBuffer,
    scene::{sample_period, Scene},
    snapshot::{Snapshot, SnapshotBoard},
    speaker::Speaker,
    Error, Result,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulatorConfig {
    /// How long [Simulator::stop] waits for the stepping thread.
    pub stop_timeout: Duration,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            stop_timeout: Duration::from_secs(1),
        }
    }
}

/// Steps a [Scene] on a background thread, one audio sample per tick, as fast
/// as the machine allows.
///
/// While running, the scene belongs to the stepping thread. Positions and the
/// clock can still be watched through the [SnapshotBoard]. Speakers and
/// microphones can only be added while the simulator is stopped.
pub struct Simulator {
    config: SimulatorConfig,
    board: Arc<SnapshotBoard>,
    state: State,
    sample_rate: Option<u32>,
}

enum State {
    Idle(Box<Scene>),
    Running(Run),
    /// The stepping thread died and took the scene with it.
    Lost,
}

struct Run {
    cancel: Arc<AtomicBool>,
    finished: Receiver<Box<Scene>>,
    handle: JoinHandle<()>,
}

impl Simulator {
    pub fn new(scene: Scene, config: SimulatorConfig) -> Self {
        Self {
            config,
            board: Arc::new(SnapshotBoard::new(&scene)),
            state: State::Idle(Box::new(scene)),
            sample_rate: None,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running(_))
    }

    pub fn scene(&self) -> Result<&Scene> {
        match &self.state {
            State::Idle(scene) => Ok(&**scene),
            State::Running(_) => Err(Error::NotIdle),
            State::Lost => Err(Error::SimulationPanicked),
        }
    }

    /// Edit the stopped scene. The board is republished once the returned
    /// handle is dropped, so snapshots and the clock reflect the edit.
    pub fn scene_mut(&mut self) -> Result<SceneMut<'_>> {
        match &mut self.state {
            State::Idle(scene) => Ok(SceneMut {
                scene: &mut **scene,
                board: &self.board,
            }),
            State::Running(_) => Err(Error::NotIdle),
            State::Lost => Err(Error::SimulationPanicked),
        }
    }

    pub fn add_speaker(&mut self, speaker: Speaker) -> Result<usize> {
        Ok(self.scene_mut()?.add_speaker(speaker))
    }

    pub fn add_microphone(&mut self, row: usize, col: usize) -> Result<usize> {
        let id = self.scene_mut()?.add_microphone(row, col)?;
        Ok(id)
    }

    /// Start stepping at `sample_rate` ticks per simulated second.
    ///
    /// The clock and all microphone recordings restart from zero. Starting an
    /// already running simulator is refused.
    pub fn start(&mut self, sample_rate: u32) -> Result<()> {
        let dt = sample_period(sample_rate)?;

        let mut scene = match std::mem::replace(&mut self.state, State::Lost) {
            State::Idle(scene) => scene,
            State::Running(run) => {
                self.state = State::Running(run);
                return Err(Error::AlreadyRunning);
            }
            State::Lost => return Err(Error::SimulationPanicked),
        };

        scene.reset_clock();
        self.board.publish(&scene);

        let cancel = Arc::new(AtomicBool::new(false));
        let (sender, finished) = mpsc::channel();

        let board = Arc::clone(&self.board);
        let thread_cancel = Arc::clone(&cancel);
        let handle = thread::spawn(move || {
            while !thread_cancel.load(Ordering::Relaxed) {
                scene.tick(dt);
                board.publish(&scene);
            }

            info!(
                "simulation stopped after {} ticks ({:.5} s simulated)",
                scene.ticks(),
                scene.elapsed_time()
            );

            // Nobody is listening only if the simulator itself is gone.
            let _ = sender.send(scene);
        });

        info!("simulation started at {sample_rate} Hz");

        self.sample_rate = Some(sample_rate);
        self.state = State::Running(Run {
            cancel,
            finished,
            handle,
        });

        Ok(())
    }

    /// Ask the stepping thread to finish its current tick and hand the scene back.
    ///
    /// Does nothing if the simulator is not running. If the thread does not
    /// finish within the configured timeout the simulator keeps running and
    /// [Error::StopTimeout] is returned; calling `stop` again waits once more.
    pub fn stop(&mut self) -> Result<()> {
        let run = match std::mem::replace(&mut self.state, State::Lost) {
            State::Running(run) => run,
            other => {
                self.state = other;
                return Ok(());
            }
        };

        run.cancel.store(true, Ordering::Relaxed);

        match run.finished.recv_timeout(self.config.stop_timeout) {
            Ok(scene) => {
                let joined = run.handle.join();
                self.state = State::Idle(scene);
                joined.map_err(|_| Error::SimulationPanicked)
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "simulation thread still busy after {:?}",
                    self.config.stop_timeout
                );
                self.state = State::Running(run);
                Err(Error::StopTimeout(self.config.stop_timeout))
            }
            Err(RecvTimeoutError::Disconnected) => {
                let _ = run.handle.join();
                Err(Error::SimulationPanicked)
            }
        }
    }

    /// Simulated seconds covered by the current (or last) run.
    pub fn elapsed_simulation_time(&self) -> f64 {
        self.board.elapsed_time()
    }

    pub fn ticks(&self) -> u64 {
        self.board.ticks()
    }

    /// Positions of every node; may mix consecutive ticks while running.
    pub fn snapshot(&self) -> Snapshot {
        self.board.snapshot()
    }

    pub fn board(&self) -> Arc<SnapshotBoard> {
        Arc::clone(&self.board)
    }

    /// Sample rate of the last run.
    pub fn sample_rate(&self) -> Option<u32> {
        self.sample_rate
    }

    /// What a microphone heard during the last run, normalized.
    pub fn recording(&self, microphone: usize) -> Result<SampleBuffer> {
        let sample_rate = self.sample_rate.ok_or(Error::InvalidSampleRate)?;
        self.scene()?.recording(microphone, sample_rate)
    }
}

/// Mutable access to an idle [Simulator]'s scene.
pub struct SceneMut<'a> {
    scene: &'a mut Scene,
    board: &'a SnapshotBoard,
}

impl Deref for SceneMut<'_> {
    type Target = Scene;

    fn deref(&self) -> &Scene {
        &*self.scene
    }
}

impl DerefMut for SceneMut<'_> {
    fn deref_mut(&mut self) -> &mut Scene {
        &mut *self.scene
    }
}

impl Drop for SceneMut<'_> {
    fn drop(&mut self) {
        self.board.publish(&*self.scene);
    }
}

impl Drop for Simulator {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            warn!("failed to stop simulation on drop: {err}");
        }
    }
}
