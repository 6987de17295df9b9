use crate::mod_config::write_atomic;
use anyhow::{Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::{fs, path::Path};

const SANDBOX_ATTR: &str = "mods_sandbox_enabled";
const SANDBOX_DISABLED: &str = "0";

/// The game's shared config, retained as the verbatim event stream it was
/// parsed from. Nothing in it is interpreted; the only mutation ever applied
/// is the forced sandbox attribute on the root.
#[derive(Debug, Clone)]
pub struct SharedConfig {
    events: Vec<Event<'static>>,
}

/// Reads the shared config and unconditionally forces the root's
/// mods_sandbox_enabled attribute to "0" (mods do not load with sandboxing
/// enabled). `Ok(None)` when the file is absent; nothing to write back later.
pub fn read(path: &Path) -> Result<Option<SharedConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = fs::read(path).with_context(|| format!("read game config {}", path.display()))?;
    let config = parse(&bytes)?;
    Ok(Some(config))
}

fn parse(bytes: &[u8]) -> Result<SharedConfig> {
    // No trim_text here: surrounding whitespace belongs to the document and
    // has to survive the round trip untouched.
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();
    let mut events = Vec::new();
    let mut root_seen = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) if !root_seen => {
                root_seen = true;
                events.push(Event::Start(disable_sandbox(&e)?));
            }
            Ok(Event::Empty(e)) if !root_seen => {
                root_seen = true;
                events.push(Event::Empty(disable_sandbox(&e)?));
            }
            Ok(event) => events.push(event.into_owned()),
            Err(err) => return Err(err).context("parse game config"),
        }
        buf.clear();
    }

    Ok(SharedConfig { events })
}

fn disable_sandbox(start: &BytesStart<'_>) -> Result<BytesStart<'static>> {
    let name = String::from_utf8(start.name().as_ref().to_vec())
        .context("game config root tag name")?;
    let mut patched = BytesStart::new(name);
    let mut found = false;

    for attr in start.attributes() {
        let attr = attr.context("game config root attribute")?;
        if attr.key.as_ref() == SANDBOX_ATTR.as_bytes() {
            patched.push_attribute((SANDBOX_ATTR, SANDBOX_DISABLED));
            found = true;
        } else {
            patched.push_attribute(attr);
        }
    }
    if !found {
        patched.push_attribute((SANDBOX_ATTR, SANDBOX_DISABLED));
    }

    Ok(patched.into_owned())
}

/// Re-emits the retained document unchanged except for whatever was mutated
/// at read time (currently only the sandbox attribute).
pub fn write(path: &Path, config: &SharedConfig) -> Result<()> {
    let mut writer = Writer::new(Vec::new());
    for event in &config.events {
        writer
            .write_event(event.clone())
            .context("serialize game config")?;
    }
    write_atomic(path, &writer.into_inner())
        .with_context(|| format!("write game config {}", path.display()))
}
