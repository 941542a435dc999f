use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use log::*;
use notify::{Event, EventKind, RecursiveMode, Watcher};

use crate::shaders::json::ShaderStage;

pub struct ShaderChanges {
    #[expect(unused)]
    watcher: notify::RecommendedWatcher,
    receiver: mpsc::Receiver<notify::Result<Event>>,
}

impl ShaderChanges {
    /// gathers all shader source edit events since this function was last called
    pub fn events(&mut self) -> anyhow::Result<Vec<Event>> {
        let events: notify::Result<Vec<Event>> = self.receiver.try_iter().collect();
        let mut events = events?;

        events.retain(is_source_change);

        Ok(events)
    }

    /// blocks until at least one shader source changes, then drains the rest
    pub fn wait(&mut self, settle: Duration) -> anyhow::Result<Vec<Event>> {
        loop {
            let first = self.receiver.recv()?;
            let first = first?;

            // editors tend to write a file in several steps
            std::thread::sleep(settle);

            let mut events = self.events()?;
            if is_source_change(&first) {
                events.insert(0, first);
            }

            if !events.is_empty() {
                return Ok(events);
            }
        }
    }
}

/// creates, edits and removals of files with a shader stage extension
pub fn is_source_change(event: &Event) -> bool {
    let relevant_kind = match event.kind {
        EventKind::Create(_) => true,
        EventKind::Modify(_) => true,
        EventKind::Remove(_) => true,

        EventKind::Access(_) => false,
        EventKind::Any => {
            error!("unexpected notify event: {event:?}");
            false
        }
        EventKind::Other => {
            error!("unexpected notify event: {event:?}");
            false
        }
    };

    relevant_kind
        && event.paths.iter().any(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .and_then(ShaderStage::from_extension)
                .is_some()
        })
}

pub fn watch(shaders_source_dir: &Path) -> notify::Result<ShaderChanges> {
    let (sender, receiver) = mpsc::channel::<notify::Result<Event>>();

    let mut watcher = notify::recommended_watcher(sender)?;
    watcher.watch(shaders_source_dir, RecursiveMode::Recursive)?;

    info!("watching {} for shader changes", shaders_source_dir.display());

    Ok(ShaderChanges { watcher, receiver })
}

#[cfg(test)]
mod tests {
    use super::*;

    use notify::event::{AccessKind, CreateKind, ModifyKind};

    #[test]
    fn shader_edits_count() {
        let event = Event::new(EventKind::Modify(ModifyKind::Any)).add_path("shaders/source/mesh.frag".into());
        assert!(is_source_change(&event));

        let event = Event::new(EventKind::Create(CreateKind::File)).add_path("mesh.comp".into());
        assert!(is_source_change(&event));
    }

    #[test]
    fn other_files_and_reads_do_not() {
        let event = Event::new(EventKind::Modify(ModifyKind::Any)).add_path("shaders/source/notes.md".into());
        assert!(!is_source_change(&event));

        let event = Event::new(EventKind::Access(AccessKind::Any)).add_path("mesh.vert".into());
        assert!(!is_source_change(&event));
    }
}
