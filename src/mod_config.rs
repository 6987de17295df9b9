use crate::registry::ModRecord;
use anyhow::{Context, Result};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Reads the game's mod order file. `Ok(None)` means the file does not exist
/// yet ("no mods configured"); malformed XML is an error and the caller keeps
/// whatever state it already had.
pub fn read(path: &Path) -> Result<Option<Vec<ModRecord>>> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes =
        fs::read(path).with_context(|| format!("read mod order file {}", path.display()))?;
    let records = parse(&bytes)?;
    Ok(Some(records))
}

fn parse(bytes: &[u8]) -> Result<Vec<ModRecord>> {
    let mut reader = Reader::from_reader(bytes);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut records = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.name().as_ref() == b"Mod" => {
                let record = record_from_element(&e, records.len())?;
                records.push(record);
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(err).context("parse mod order file"),
            _ => {}
        }
        buf.clear();
    }

    Ok(records)
}

fn record_from_element(e: &BytesStart<'_>, index: usize) -> Result<ModRecord> {
    let id = attr_value(e, b"name").unwrap_or_default();
    let enabled = decode_flag(attr_value(e, b"enabled").as_deref());
    let fold_open = attr_value(e, b"settings_fold_open").unwrap_or_else(|| "0".to_string());
    let workshop_item_id = match attr_value(e, b"workshop_item_id") {
        Some(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("invalid workshop_item_id {raw:?} for mod {id:?}"))?,
        None => 0,
    };

    Ok(ModRecord {
        display_name: id.clone(),
        id,
        order: index,
        enabled,
        workshop_item_id,
        folder: PathBuf::new(),
        fold_open,
    })
}

/// The game stores booleans as "1"/"0"; only the literal "1" counts as set.
fn decode_flag(value: Option<&str>) -> bool {
    value == Some("1")
}

fn encode_flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

pub(crate) fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            if let Ok(value) = attr.unescape_value() {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Writes all records, disabled mods included, ascending by order. The blank
/// line between siblings and the two-space indent are part of the on-disk
/// contract: the game re-parses this file and operators diff it, so the
/// rendering must be stable run-to-run.
pub fn write(path: &Path, records: &[ModRecord]) -> Result<()> {
    let xml = render(records)?;
    write_atomic(path, xml.as_bytes())
        .with_context(|| format!("write mod order file {}", path.display()))
}

fn render(records: &[ModRecord]) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Start(BytesStart::new("Mods")))
        .context("serialize mod order")?;

    for record in records {
        writer
            .write_event(Event::Text(BytesText::from_escaped("\n\n  ")))
            .context("serialize mod order")?;
        let mut element = BytesStart::new("Mod");
        element.push_attribute(("enabled", encode_flag(record.enabled)));
        element.push_attribute(("name", record.id.as_str()));
        element.push_attribute(("settings_fold_open", record.fold_open.as_str()));
        element.push_attribute((
            "workshop_item_id",
            record.workshop_item_id.to_string().as_str(),
        ));
        writer
            .write_event(Event::Empty(element))
            .context("serialize mod order")?;
    }

    writer
        .write_event(Event::Text(BytesText::from_escaped("\n\n")))
        .context("serialize mod order")?;
    writer
        .write_event(Event::End(BytesEnd::new("Mods")))
        .context("serialize mod order")?;

    let mut xml = String::from_utf8(writer.into_inner()).context("mod order utf-8")?;
    xml.push('\n');
    Ok(xml.replace("/>", " />"))
}

/// Serialize next to the target and rename over it, so a failed write never
/// corrupts the previous file.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path.parent().context("resolve target directory")?;
    fs::create_dir_all(parent).context("create target directory")?;
    let file_name = path.file_name().context("resolve target filename")?;
    let mut temp_name = std::ffi::OsString::from(file_name);
    temp_name.push(".tmp");
    let temp_path = parent.join(temp_name);
    fs::write(&temp_path, contents).context("write temp file")?;
    fs::rename(&temp_path, path).context("replace target file")?;
    Ok(())
}
