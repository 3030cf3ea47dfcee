//! Binary container decoding: file header, chunk framing, and the INST,
//! PRNT, META and SSTR chunk decoders. PROP decoding lives in [`prop`].

mod codec;
mod cursor;
mod prop;

use crate::document::{Document, Instance, SharedString, Type};
use crate::error::{Error, Result};
use cursor::ByteCursor;
use prop::SharedStringSlot;
use std::path::Path;
use tracing::{debug, info, warn};

const MAGIC: [u8; 8] = *b"<roblox!";
const SIGNATURE: [u8; 6] = [0x89, 0xff, 0x0d, 0x0a, 0x1a, 0x0a];

const CHUNK_INSTANCES: [u8; 4] = *b"INST";
const CHUNK_PROPERTIES: [u8; 4] = *b"PROP";
const CHUNK_PARENTS: [u8; 4] = *b"PRNT";
const CHUNK_METADATA: [u8; 4] = *b"META";
const CHUNK_SHARED_STRINGS: [u8; 4] = *b"SSTR";
const CHUNK_SIGNATURES: [u8; 4] = *b"SIGN";
const CHUNK_HASH: [u8; 4] = *b"HASH";
const CHUNK_END: [u8; 4] = *b"END\0";

/// Object declaration formats carried by INST chunks.
const OBJECT_FORMAT_PLAIN: u8 = 0;
const OBJECT_FORMAT_SERVICE: u8 = 1;

/// The only parent-link format in use.
const PARENT_LINK_FORMAT_PLAIN: u8 = 0;

struct ChunkHeader {
    name: [u8; 4],
    compressed_size: u32,
    uncompressed_size: u32,
    reserved: u32,
}

impl ChunkHeader {
    fn read(cur: &mut ByteCursor) -> Result<Self> {
        let mut name = [0u8; 4];
        cur.read_into(&mut name)?;
        Ok(Self {
            name,
            compressed_size: cur.read_u32()?,
            uncompressed_size: cur.read_u32()?,
            reserved: cur.read_u32()?,
        })
    }
}

/// Resolve a chunk's payload into a fresh cursor: empty, copied verbatim, or
/// decompressed to the declared uncompressed size.
fn read_chunk_payload(header: &ChunkHeader, file: &mut ByteCursor) -> Result<ByteCursor> {
    let size = header.uncompressed_size as usize;
    if size == 0 {
        return Ok(ByteCursor::empty());
    }
    if header.compressed_size == 0 {
        return ByteCursor::from_cursor(file, size);
    }
    let compressed_size = header.compressed_size as usize;
    let payload = ByteCursor::from_compressed(file.view(compressed_size)?, size)?;
    file.skip(compressed_size)?;
    Ok(payload)
}

/// Load a binary scene document. All-or-nothing: any decode error surfaces
/// here and no document is produced.
pub(crate) fn load(path: &Path) -> Result<Document> {
    let mut file = ByteCursor::from_file(path)?;

    let mut magic = [0u8; 8];
    file.read_into(&mut magic)?;
    if magic != MAGIC {
        return Err(Error::UnrecognizedFormat);
    }
    let mut signature = [0u8; 6];
    file.read_into(&mut signature)?;
    if signature != SIGNATURE {
        return Err(Error::UnrecognizedFormat);
    }
    let version = file.read_u16()?;
    if version != 0 {
        return Err(Error::UnsupportedVersion(version));
    }

    let type_count = file.read_u32()? as usize;
    let object_count = file.read_u32()? as usize;
    file.skip(8)?; // two reserved words

    let mut doc = Document {
        types: vec![Type::default(); type_count],
        instances: vec![Instance::default(); object_count],
        ..Document::default()
    };
    let mut shared_slots: Vec<SharedStringSlot> = Vec::new();

    let mut chunk_index = 0usize;
    while file.tell() < file.len() {
        let header = ChunkHeader::read(&mut file)?;
        let mut payload = read_chunk_payload(&header, &mut file)?;
        debug!(
            name = %String::from_utf8_lossy(&header.name),
            size = header.uncompressed_size,
            compressed = header.compressed_size,
            "chunk"
        );

        match header.name {
            CHUNK_INSTANCES => read_instances(&mut payload, &mut doc)?,
            CHUNK_PROPERTIES => prop::read_properties(&mut payload, &mut doc, &mut shared_slots)?,
            CHUNK_PARENTS => read_parents(&mut payload, &mut doc)?,
            CHUNK_METADATA => {
                // Historically META must come first; treat as a soft rule.
                if chunk_index != 0 {
                    warn!("metadata chunk is not the first chunk in the file");
                }
                read_metadata(&header, &mut payload, &mut doc)?;
            }
            CHUNK_SHARED_STRINGS => read_shared_strings(&mut payload, &mut doc)?,
            CHUNK_SIGNATURES | CHUNK_HASH => {}
            CHUNK_END => break,
            other => {
                debug!(name = %String::from_utf8_lossy(&other), "skipping unknown chunk");
            }
        }
        chunk_index += 1;
    }

    prop::resolve_shared_strings(&mut doc, shared_slots)?;

    info!(
        types = doc.types.len(),
        instances = doc.instances.len(),
        "loaded document"
    );
    Ok(doc)
}

/// INST: declare a type's name and the ids of all its instances.
fn read_instances(cur: &mut ByteCursor, doc: &mut Document) -> Result<()> {
    let type_index = cur.read_u32()?;
    let type_name = codec::read_string(cur)?;

    let format = cur.read_u8()?;
    if format != OBJECT_FORMAT_PLAIN && format != OBJECT_FORMAT_SERVICE {
        return Err(Error::layout(format!("object format {format}")));
    }
    let is_service = format == OBJECT_FORMAT_SERVICE;

    let id_count = cur.read_u32()? as usize;
    let ids = codec::read_id_array(cur, id_count)?;

    let rooted_flags = if is_service {
        codec::read_u8_run(cur, id_count)?
    } else {
        Vec::new()
    };

    let slot = doc
        .types
        .get_mut(type_index as usize)
        .ok_or_else(|| Error::corrupt(format!("type index {type_index} out of range")))?;
    slot.name = type_name;

    let object_count = doc.instances.len();
    for (i, &id) in ids.iter().enumerate() {
        let index = usize::try_from(id)
            .ok()
            .filter(|&idx| idx < object_count)
            .ok_or_else(|| Error::corrupt(format!("instance id {id} out of range")))?;
        doc.instances[index] = Instance {
            parent_id: -1,
            id,
            type_index,
            is_service,
            is_service_rooted: is_service && rooted_flags[i] != 0,
            ..Instance::default()
        };
    }
    Ok(())
}

/// PRNT: two aligned id columns, children then parents.
fn read_parents(cur: &mut ByteCursor, doc: &mut Document) -> Result<()> {
    let format = cur.read_u8()?;
    if format != PARENT_LINK_FORMAT_PLAIN {
        return Err(Error::layout(format!("parent link format {format}")));
    }

    let link_count = cur.read_u32()? as usize;
    let child_ids = codec::read_id_array(cur, link_count)?;
    let parent_ids = codec::read_id_array(cur, link_count)?;

    let object_count = doc.instances.len();
    for (&child, &parent) in child_ids.iter().zip(&parent_ids) {
        let child_index = usize::try_from(child)
            .ok()
            .filter(|&idx| idx < object_count)
            .ok_or_else(|| Error::corrupt(format!("child id {child} out of range")))?;
        doc.instances[child_index].parent_id = if parent >= 0 { parent } else { -1 };

        if parent >= 0 {
            let parent_index = usize::try_from(parent)
                .ok()
                .filter(|&idx| idx < object_count)
                .ok_or_else(|| Error::corrupt(format!("parent id {parent} out of range")))?;
            doc.instances[parent_index].child_ids.push(child);
        }
    }
    Ok(())
}

/// META: key/value string pairs describing the file.
fn read_metadata(header: &ChunkHeader, cur: &mut ByteCursor, doc: &mut Document) -> Result<()> {
    if header.reserved != 0 {
        return Err(Error::layout(format!(
            "metadata chunk version {}",
            header.reserved
        )));
    }
    let count = cur.read_u32()?;
    for _ in 0..count {
        let name = codec::read_string(cur)?;
        let value = codec::read_string(cur)?;
        doc.metadata.insert(name, value);
    }
    Ok(())
}

/// SSTR: the ordered shared string dictionary.
fn read_shared_strings(cur: &mut ByteCursor, doc: &mut Document) -> Result<()> {
    let version = cur.read_u32()?;
    if version != 0 {
        return Err(Error::layout(format!("shared string dictionary version {version}")));
    }
    let count = cur.read_u32()?;
    for _ in 0..count {
        let mut hash = [0u8; 16];
        cur.read_into(&mut hash)?;
        let content = codec::read_string(cur)?;
        doc.shared_strings.push(SharedString { hash, content });
    }
    Ok(())
}
