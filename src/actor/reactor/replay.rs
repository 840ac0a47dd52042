//! Recording reactor input and feeding it back later.
//!
//! A recording is one RON-encoded [`Event`] per line, in the order the reactor
//! handled them. Replaying a recording against the same initial world
//! reproduces the same roles and geometry, since the reactor is deterministic
//! given its input (focus debounce generations included).

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use tracing::{info, warn};

use super::{Event, Reactor};
use crate::sys::window_system::WindowSystem;

pub struct Record {
    file: Option<BufWriter<File>>,
}

impl Record {
    pub fn new(path: Option<&Path>) -> anyhow::Result<Record> {
        let file = match path {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("creating recording {}", path.display()))?;
                info!(path = %path.display(), "recording reactor events");
                Some(BufWriter::new(file))
            }
            None => None,
        };
        Ok(Record { file })
    }

    pub fn disabled() -> Record { Record { file: None } }

    pub fn is_enabled(&self) -> bool { self.file.is_some() }

    pub fn on_event(&mut self, event: &Event) {
        let Some(file) = &mut self.file else { return };
        if let Event::QueryLayout(_) = event {
            return;
        }
        let result = ron::to_string(event)
            .map_err(anyhow::Error::from)
            .and_then(|line| writeln!(file, "{line}").map_err(anyhow::Error::from))
            .and_then(|()| file.flush().map_err(anyhow::Error::from));
        if let Err(e) = result {
            warn!(error = %e, "could not record event; recording stopped");
            self.file = None;
        }
    }
}

/// Feeds every event in the recording at `path` through the reactor, stopping
/// at a recorded `Disable`. Returns how many events were handled.
pub fn replay<W: WindowSystem>(path: &Path, reactor: &mut Reactor<W>) -> anyhow::Result<usize> {
    let file =
        File::open(path).with_context(|| format!("opening recording {}", path.display()))?;
    let mut handled = 0;
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event: Event = ron::from_str(&line)
            .with_context(|| format!("{}:{}: malformed event", path.display(), idx + 1))?;
        if let Event::Disable = event {
            break;
        }
        reactor.handle_event(event);
        handled += 1;
    }
    info!(handled, "replay finished");
    Ok(handled)
}
