//! PROP chunk decoding: one column reader per storage format.
//!
//! A PROP chunk carries one property for every instance of one type. The
//! destination order is the ascending-id order of that type's instances,
//! which matches the order the columns were written in.

use super::codec;
use super::cursor::ByteCursor;
use crate::document::{
    BrickColor, CFrame, Color3, ColorKeypoint, ColorSequence, Document, FontInfo, Mat3,
    NumberKeypoint, NumberRange, NumberSequence, OptionalCFrame, PhysicalProperties, Property,
    PropertyFormat, PropertyValue, Rect2D, UDim2, UniqueId, Vec2, Vec3,
};
use crate::error::{Error, Result};

/// A SharedString property slot waiting for the SSTR table. Resolution is
/// deferred to the end of the load so chunk order does not matter.
pub(crate) struct SharedStringSlot {
    pub instance: usize,
    pub property: usize,
    pub index: u32,
}

/// Unit vector for a face id: +e0..+e2 for 0..2, -e0..-e2 for 3..5.
fn normal_id_to_vec3(id: u8) -> Vec3 {
    let sign = if id >= 3 { -1.0 } else { 1.0 };
    let mut v = Vec3::default();
    match id % 3 {
        0 => v.x = sign,
        1 => v.y = sign,
        _ => v.z = sign,
    }
    v
}

/// Canonical axis-aligned rotation for an orientation id in 0..35.
pub(crate) fn orientation_matrix(orient_id: u8) -> Mat3 {
    let x_axis = normal_id_to_vec3(orient_id / 6);
    let y_axis = normal_id_to_vec3(orient_id % 6);
    let z_axis = x_axis.cross(y_axis);
    Mat3::from_rows(x_axis, y_axis, z_axis)
}

/// One rotation: a nonzero orientation id selects a canonical axis-aligned
/// matrix, zero is followed by the full nine floats row-major.
fn read_rotation(cur: &mut ByteCursor) -> Result<Mat3> {
    let orient_id = cur.read_u8()?;
    if orient_id != 0 {
        return Ok(orientation_matrix(orient_id - 1));
    }
    let mut m = [0.0f32; 9];
    for cell in &mut m {
        *cell = cur.read_f32()?;
    }
    Ok(Mat3 { m })
}

/// Rotations for all instances, then the three translation columns.
fn read_cframe_column(cur: &mut ByteCursor, count: usize) -> Result<Vec<CFrame>> {
    let mut rotations = Vec::with_capacity(count);
    for _ in 0..count {
        rotations.push(read_rotation(cur)?);
    }
    let tx = codec::read_interleaved_f32(cur, count)?;
    let ty = codec::read_interleaved_f32(cur, count)?;
    let tz = codec::read_interleaved_f32(cur, count)?;

    Ok(rotations
        .into_iter()
        .enumerate()
        .map(|(i, rotation)| CFrame {
            rotation,
            translation: Vec3 { x: tx[i], y: ty[i], z: tz[i] },
        })
        .collect())
}

fn read_string_values(cur: &mut ByteCursor, count: usize) -> Result<Vec<PropertyValue>> {
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        values.push(PropertyValue::String(codec::read_string(cur)?));
    }
    Ok(values)
}

fn read_bool_values(cur: &mut ByteCursor, count: usize) -> Result<Vec<PropertyValue>> {
    Ok(codec::read_u8_run(cur, count)?
        .into_iter()
        .map(|b| PropertyValue::Bool(b != 0))
        .collect())
}

fn read_double_values(cur: &mut ByteCursor, count: usize) -> Result<Vec<PropertyValue>> {
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        values.push(PropertyValue::Double(cur.read_f64()?));
    }
    Ok(values)
}

fn read_udim2_values(cur: &mut ByteCursor, count: usize) -> Result<Vec<PropertyValue>> {
    let sx = codec::read_interleaved_f32(cur, count)?;
    let sy = codec::read_interleaved_f32(cur, count)?;
    let ox = codec::read_interleaved_i32(cur, count)?;
    let oy = codec::read_interleaved_i32(cur, count)?;
    Ok((0..count)
        .map(|i| {
            PropertyValue::UDim2(UDim2 {
                scale_x: sx[i],
                scale_y: sy[i],
                offset_x: ox[i],
                offset_y: oy[i],
            })
        })
        .collect())
}

fn read_rect2d_values(cur: &mut ByteCursor, count: usize) -> Result<Vec<PropertyValue>> {
    let x0 = codec::read_interleaved_f32(cur, count)?;
    let y0 = codec::read_interleaved_f32(cur, count)?;
    let x1 = codec::read_interleaved_f32(cur, count)?;
    let y1 = codec::read_interleaved_f32(cur, count)?;
    Ok((0..count)
        .map(|i| PropertyValue::Rect2D(Rect2D { x0: x0[i], y0: y0[i], x1: x1[i], y1: y1[i] }))
        .collect())
}

fn read_vector2_values(cur: &mut ByteCursor, count: usize) -> Result<Vec<PropertyValue>> {
    let x = codec::read_interleaved_f32(cur, count)?;
    let y = codec::read_interleaved_f32(cur, count)?;
    Ok((0..count)
        .map(|i| PropertyValue::Vector2(Vec2 { x: x[i], y: y[i] }))
        .collect())
}

fn read_vector3_values(cur: &mut ByteCursor, count: usize) -> Result<Vec<PropertyValue>> {
    let x = codec::read_interleaved_f32(cur, count)?;
    let y = codec::read_interleaved_f32(cur, count)?;
    let z = codec::read_interleaved_f32(cur, count)?;
    Ok((0..count)
        .map(|i| PropertyValue::Vector3(Vec3 { x: x[i], y: y[i], z: z[i] }))
        .collect())
}

fn read_color3_values(cur: &mut ByteCursor, count: usize) -> Result<Vec<PropertyValue>> {
    let r = codec::read_interleaved_f32(cur, count)?;
    let g = codec::read_interleaved_f32(cur, count)?;
    let b = codec::read_interleaved_f32(cur, count)?;
    Ok((0..count)
        .map(|i| PropertyValue::Color3(Color3 { r: r[i], g: g[i], b: b[i] }))
        .collect())
}

fn read_color3_u8_values(cur: &mut ByteCursor, count: usize) -> Result<Vec<PropertyValue>> {
    let r = codec::read_u8_run(cur, count)?;
    let g = codec::read_u8_run(cur, count)?;
    let b = codec::read_u8_run(cur, count)?;
    Ok((0..count)
        .map(|i| {
            PropertyValue::Color3(Color3 {
                r: f32::from(r[i]) / 255.0,
                g: f32::from(g[i]) / 255.0,
                b: f32::from(b[i]) / 255.0,
            })
        })
        .collect())
}

fn read_unique_id_values(cur: &mut ByteCursor, count: usize) -> Result<Vec<PropertyValue>> {
    let indices = codec::read_interleaved_u32(cur, count)?;
    let timestamps = codec::read_interleaved_u32(cur, count)?;
    let raws = codec::read_interleaved_i64(cur, count)?;
    Ok((0..count)
        .map(|i| {
            PropertyValue::UniqueId(UniqueId {
                index: indices[i],
                timestamp: timestamps[i],
                raw: raws[i],
            })
        })
        .collect())
}

fn read_optional_cframe_values(cur: &mut ByteCursor, count: usize) -> Result<Vec<PropertyValue>> {
    let sub = cur.read_u8()?;
    if PropertyFormat::from_tag(sub) != Some(PropertyFormat::CFrameMatrix) {
        return Err(Error::layout(format!("optional cframe subformat {sub}")));
    }
    let frames = read_cframe_column(cur, count)?;

    let sub = cur.read_u8()?;
    if PropertyFormat::from_tag(sub) != Some(PropertyFormat::Bool) {
        return Err(Error::layout(format!("optional cframe flag subformat {sub}")));
    }
    let flags = codec::read_u8_run(cur, count)?;

    Ok(frames
        .into_iter()
        .zip(flags)
        .map(|(frame, flag)| {
            PropertyValue::OptionalCFrame(OptionalCFrame { frame, has_data: flag != 0 })
        })
        .collect())
}

fn read_number_sequence_values(cur: &mut ByteCursor, count: usize) -> Result<Vec<PropertyValue>> {
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        let keypoint_count = cur.read_u32()? as usize;
        let mut keypoints = Vec::with_capacity(keypoint_count);
        for _ in 0..keypoint_count {
            keypoints.push(NumberKeypoint {
                time: cur.read_f32()?,
                value: cur.read_f32()?,
                envelope: cur.read_f32()?,
            });
        }
        values.push(PropertyValue::NumberSequence(NumberSequence { keypoints }));
    }
    Ok(values)
}

fn read_color_sequence_values(cur: &mut ByteCursor, count: usize) -> Result<Vec<PropertyValue>> {
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        let keypoint_count = cur.read_u32()? as usize;
        let mut keypoints = Vec::with_capacity(keypoint_count);
        for _ in 0..keypoint_count {
            keypoints.push(ColorKeypoint {
                time: cur.read_f32()?,
                color: Color3 { r: cur.read_f32()?, g: cur.read_f32()?, b: cur.read_f32()? },
                envelope: cur.read_f32()?,
            });
        }
        values.push(PropertyValue::ColorSequence(ColorSequence { keypoints }));
    }
    Ok(values)
}

fn read_number_range_values(cur: &mut ByteCursor, count: usize) -> Result<Vec<PropertyValue>> {
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        values.push(PropertyValue::NumberRange(NumberRange {
            min: cur.read_f32()?,
            max: cur.read_f32()?,
        }));
    }
    Ok(values)
}

const CUSTOM_PHYSICS_MASK: u8 = 0x01;

fn read_physical_values(cur: &mut ByteCursor, count: usize) -> Result<Vec<PropertyValue>> {
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        let flag = cur.read_u8()?;
        let mut props = PhysicalProperties::default();
        if flag & CUSTOM_PHYSICS_MASK != 0 {
            props.density = cur.read_f32()?;
            props.friction = cur.read_f32()?;
            props.elasticity = cur.read_f32()?;
            props.friction_weight = cur.read_f32()?;
            props.elasticity_weight = cur.read_f32()?;
            if flag >= 2 {
                props.acoustic_absorption = cur.read_f32()?;
            }
        }
        values.push(PropertyValue::PhysicalProperties(props));
    }
    Ok(values)
}

fn read_font_values(cur: &mut ByteCursor, count: usize) -> Result<Vec<PropertyValue>> {
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        values.push(PropertyValue::Font(FontInfo {
            family: codec::read_string(cur)?,
            weight: cur.read_u16()?,
            style: cur.read_u8()?,
            cached_face_id: codec::read_string(cur)?,
        }));
    }
    Ok(values)
}

/// Decode one PROP chunk and append a property to every instance of the
/// referenced type, in ascending instance-id order.
pub(crate) fn read_properties(
    cur: &mut ByteCursor,
    doc: &mut Document,
    shared_slots: &mut Vec<SharedStringSlot>,
) -> Result<()> {
    let type_index = cur.read_u32()?;
    let name = codec::read_string(cur)?;
    let tag = cur.read_u8()?;

    if type_index as usize >= doc.types.len() {
        return Err(Error::corrupt(format!(
            "property chunk references type {type_index}, only {} declared",
            doc.types.len()
        )));
    }

    // Ascending index order is the contract with the column layout.
    let targets: Vec<usize> = doc
        .instances
        .iter()
        .enumerate()
        .filter(|(_, inst)| inst.type_index == type_index)
        .map(|(i, _)| i)
        .collect();
    let count = targets.len();

    let format = PropertyFormat::from_tag(tag);

    // SharedString columns attach placeholders now and resolve against the
    // SSTR table once the whole file is read.
    if format == Some(PropertyFormat::SharedStringDictionaryIndex) {
        let indices = codec::read_interleaved_u32(cur, count)?;
        for (&index, &instance) in indices.iter().zip(&targets) {
            let properties = &mut doc.instances[instance].properties;
            shared_slots.push(SharedStringSlot { instance, property: properties.len(), index });
            properties.push(Property {
                name: name.clone(),
                kind: PropertyFormat::SharedStringDictionaryIndex,
                value: PropertyValue::String(String::new()),
            });
        }
        return Ok(());
    }

    let values = match format {
        Some(PropertyFormat::String) => read_string_values(cur, count)?,
        Some(PropertyFormat::Bool) => read_bool_values(cur, count)?,
        Some(PropertyFormat::Int) => codec::read_interleaved_i32(cur, count)?
            .into_iter()
            .map(PropertyValue::Int32)
            .collect(),
        Some(PropertyFormat::Int64) => codec::read_interleaved_i64(cur, count)?
            .into_iter()
            .map(PropertyValue::Int64)
            .collect(),
        Some(PropertyFormat::Float) => codec::read_interleaved_f32(cur, count)?
            .into_iter()
            .map(PropertyValue::Float)
            .collect(),
        Some(PropertyFormat::Double) => read_double_values(cur, count)?,
        Some(PropertyFormat::UDim2) => read_udim2_values(cur, count)?,
        Some(PropertyFormat::Rect2D) => read_rect2d_values(cur, count)?,
        Some(PropertyFormat::Vector2) => read_vector2_values(cur, count)?,
        Some(PropertyFormat::Vector3) => read_vector3_values(cur, count)?,
        Some(PropertyFormat::Color3) => read_color3_values(cur, count)?,
        Some(PropertyFormat::Color3Uint8) => read_color3_u8_values(cur, count)?,
        Some(PropertyFormat::Enum) => codec::read_interleaved_u32(cur, count)?
            .into_iter()
            .map(PropertyValue::Enum)
            .collect(),
        Some(PropertyFormat::Ref) => codec::read_id_array(cur, count)?
            .into_iter()
            .map(PropertyValue::Ref)
            .collect(),
        Some(PropertyFormat::BrickColor) => codec::read_interleaved_u32(cur, count)?
            .into_iter()
            .map(|index| PropertyValue::BrickColor(BrickColor { index }))
            .collect(),
        Some(PropertyFormat::UniqueId) => read_unique_id_values(cur, count)?,
        Some(PropertyFormat::CFrameMatrix) => read_cframe_column(cur, count)?
            .into_iter()
            .map(PropertyValue::CFrame)
            .collect(),
        Some(PropertyFormat::OptionalCFrame) => read_optional_cframe_values(cur, count)?,
        Some(PropertyFormat::NumberSequence) => read_number_sequence_values(cur, count)?,
        Some(PropertyFormat::ColorSequenceV1) => read_color_sequence_values(cur, count)?,
        Some(PropertyFormat::NumberRange) => read_number_range_values(cur, count)?,
        Some(PropertyFormat::PhysicalProperties) => read_physical_values(cur, count)?,
        Some(PropertyFormat::Font) => read_font_values(cur, count)?,
        // Formats without a decoder and tags outside the set both attach
        // empty Unknown-kind properties; the payload is left unread.
        _ => vec![PropertyValue::Unknown; count],
    };

    // Kinds without a decoder surface as Unknown regardless of the wire tag.
    let kind = if matches!(values.first(), Some(PropertyValue::Unknown)) {
        PropertyFormat::Unknown
    } else {
        format.unwrap_or(PropertyFormat::Unknown)
    };

    debug_assert_eq!(values.len(), count);
    for (value, &instance) in values.into_iter().zip(&targets) {
        doc.instances[instance].properties.push(Property {
            name: name.clone(),
            kind,
            value,
        });
    }
    Ok(())
}

/// Replace SharedString placeholders with the dictionary content they index.
pub(crate) fn resolve_shared_strings(
    doc: &mut Document,
    slots: Vec<SharedStringSlot>,
) -> Result<()> {
    for slot in slots {
        let entry = doc.shared_strings.get(slot.index as usize).ok_or_else(|| {
            Error::corrupt(format!(
                "shared string index {} out of range ({} entries)",
                slot.index,
                doc.shared_strings.len()
            ))
        })?;
        let content = entry.content.clone();
        doc.instances[slot.instance].properties[slot.property].value =
            PropertyValue::String(content);
    }
    Ok(())
}
