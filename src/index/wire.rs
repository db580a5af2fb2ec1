//! Binary codec for the aggregate record
//!
//! Field order is fixed. The two extension slots are the only part whose
//! framing depends on the peer version: from the skippable-fields threshold
//! on, every entry body carries a vint byte length, so a reader without a
//! hook can step over it. Older streams carry no length and cannot be
//! skipped at all.

use tracing::{debug, trace};

use crate::errors::{MetadataError, MetadataResult};
use crate::settings::SettingsView;
use crate::stream::{StreamInput, StreamOutput};
use crate::version::WireVersion;

use super::alias::AliasEntry;
use super::context::ContextEntry;
use super::extensions::WireExtensions;
use super::mapping::MappingEntry;
use super::record::{IndexMetadata, IndexMetadataBuilder, IndexState};

impl IndexMetadata {
    /// Encodes the record for a peer at `version`.
    pub fn to_bytes(&self, version: WireVersion, extensions: &WireExtensions) -> MetadataResult<Vec<u8>> {
        let mut out = StreamOutput::with_capacity(version, 256);
        self.write_to(&mut out, extensions)?;
        Ok(out.into_bytes())
    }

    pub fn from_bytes(
        bytes: &[u8],
        version: WireVersion,
        extensions: &WireExtensions,
    ) -> MetadataResult<Self> {
        let mut input = StreamInput::new(bytes, version);
        let metadata = Self::read_from(&mut input, extensions)?;
        if input.remaining() > 0 {
            trace!(
                index = %metadata.index,
                trailing = input.remaining(),
                "bytes left after index metadata"
            );
        }
        Ok(metadata)
    }

    pub fn write_to(&self, out: &mut StreamOutput, extensions: &WireExtensions) -> MetadataResult<()> {
        out.write_string(&self.index);
        out.write_long(self.version as i64);
        out.write_vlong(self.mapping_version);
        out.write_vlong(self.settings_version);
        out.write_vlong(self.aliases_version);
        out.write_int(self.routing_num_shards);
        out.write_byte(self.state.as_byte());
        self.settings.write_to(out);
        out.write_vlong_array(&self.primary_terms);

        out.write_len(self.mappings.len());
        for mapping in self.mappings.values() {
            mapping.write_to(out);
        }

        out.write_len(self.aliases.len());
        for alias in self.aliases.values() {
            alias.write_to(out);
        }

        match (&extensions.custom_data_writer, &self.custom_data) {
            (Some(writer), Some(entries)) => {
                out.write_len(entries.len());
                for (key, value) in entries {
                    out.write_string(key);
                    out.write_skippable(|body| writer(value, body))?;
                }
            }
            (None, Some(entries)) if !entries.is_empty() => {
                debug!(index = %self.index, entries = entries.len(), "no custom data writer, writing empty slot");
                out.write_vint(0);
            }
            _ => out.write_vint(0),
        }

        out.write_len(self.in_sync_allocation_ids.len());
        for (shard, ids) in &self.in_sync_allocation_ids {
            out.write_vint(*shard);
            out.write_string_collection(ids);
        }

        match (&extensions.rollover_writer, &self.rollover_infos) {
            (Some(writer), Some(entries)) => {
                // rollover entries carry no key; readers derive it from the value
                out.write_len(entries.len());
                for value in entries.values() {
                    out.write_skippable(|body| writer(value, body))?;
                }
            }
            (None, Some(entries)) if !entries.is_empty() => {
                debug!(index = %self.index, entries = entries.len(), "no rollover writer, writing empty slot");
                out.write_vint(0);
            }
            _ => out.write_vint(0),
        }

        out.write_bool(self.is_system);

        if out.version().on_or_after(WireVersion::V_2_17_0) {
            match &self.context {
                Some(context) => {
                    out.write_bool(true);
                    context.write_to(out);
                }
                None => out.write_bool(false),
            }
        }

        if out.version().on_or_after(WireVersion::V_3_0_0) {
            match self.ingestion_paused {
                Some(paused) => {
                    out.write_bool(true);
                    out.write_bool(paused);
                }
                None => out.write_bool(false),
            }
        }

        Ok(())
    }

    pub fn read_from(input: &mut StreamInput<'_>, extensions: &WireExtensions) -> MetadataResult<Self> {
        let index = input.read_string()?;
        let version = input.read_long()?;
        let version = u64::try_from(version).map_err(|_| {
            MetadataError::decode(format!("negative metadata version [{}] for [{}]", version, index))
        })?;

        let mut builder = IndexMetadataBuilder::new(index)
            .version(version)
            .mapping_version(input.read_vlong()?)
            .settings_version(input.read_vlong()?)
            .aliases_version(input.read_vlong()?)
            .routing_num_shards(input.read_int()?)
            .state(IndexState::from_byte(input.read_byte()?)?)
            .settings(SettingsView::read_from(input)?)
            .primary_terms(input.read_vlong_array()?);

        let mappings = input.read_len()?;
        for _ in 0..mappings {
            builder = builder.put_mapping(MappingEntry::read_from(input)?);
        }

        let aliases = input.read_len()?;
        for _ in 0..aliases {
            builder = builder.put_alias(AliasEntry::read_from(input)?);
        }

        builder = read_custom_data(input, extensions, builder)?;

        let in_sync = input.read_len()?;
        for _ in 0..in_sync {
            let shard = input.read_vint()?;
            let ids = input.read_string_set()?;
            builder = builder.put_in_sync_allocation_ids(shard, ids);
        }

        builder = read_rollover_infos(input, extensions, builder)?;

        builder = builder.system(input.read_bool()?);

        if input.version().on_or_after(WireVersion::V_2_17_0) && input.read_bool()? {
            builder = builder.context(Some(ContextEntry::read_from(input)?));
        }

        if input.version().on_or_after(WireVersion::V_3_0_0) && input.read_bool()? {
            builder = builder.ingestion_paused(Some(input.read_bool()?));
        }

        Ok(builder.build())
    }
}

/// Steps over one length-prefixed entry, or fails if the stream predates
/// length prefixes.
fn skip_entry(input: &mut StreamInput<'_>, slot: &str) -> MetadataResult<()> {
    if !input.version().supports_skippable_fields() {
        return Err(MetadataError::configuration(format!(
            "cannot skip {} without a reader for stream version {} (< {})",
            slot,
            input.version(),
            WireVersion::SKIPPABLE_FIELDS_VERSION
        )));
    }
    let len = input.read_len()?;
    trace!(slot, len, "skipping extension entry");
    input.skip(len).map_err(|e| {
        MetadataError::corrupt_caused_by(format!("failed to skip {} bytes of {}", len, slot), e)
    })
}

fn read_custom_data(
    input: &mut StreamInput<'_>,
    extensions: &WireExtensions,
    mut builder: IndexMetadataBuilder,
) -> MetadataResult<IndexMetadataBuilder> {
    let count = input.read_len()?;
    match &extensions.custom_data_reader {
        Some(reader) => {
            builder = builder.custom_data_decoded();
            for _ in 0..count {
                let key = input.read_string()?;
                if input.version().supports_skippable_fields() {
                    input.read_len()?;
                }
                builder = builder.put_custom_data(key, reader(input)?);
            }
        }
        None => {
            for _ in 0..count {
                let key = input.read_string()?;
                trace!(key = %key, "custom data entry without reader");
                skip_entry(input, "customData")?;
            }
        }
    }
    Ok(builder)
}

fn read_rollover_infos(
    input: &mut StreamInput<'_>,
    extensions: &WireExtensions,
    mut builder: IndexMetadataBuilder,
) -> MetadataResult<IndexMetadataBuilder> {
    let count = input.read_len()?;
    match &extensions.rollover_reader {
        Some(rollover) => {
            builder = builder.rollover_infos_decoded();
            for _ in 0..count {
                if input.version().supports_skippable_fields() {
                    input.read_len()?;
                }
                let info = (rollover.read)(input)?;
                let key = (rollover.key)(&info);
                builder = builder.put_rollover_info(key, info);
            }
        }
        None => {
            for _ in 0..count {
                skip_entry(input, "rolloverInfos")?;
            }
        }
    }
    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::extensions::OpaqueValue;
    use serde_json::json;

    fn string_ext() -> WireExtensions {
        WireExtensions::none()
            .with_custom_data_reader(|input| Ok(OpaqueValue::new(input.read_string()?)))
            .with_custom_data_writer(|value, out| {
                out.write_string(value.downcast_ref::<String>().map(String::as_str).unwrap_or(""));
                Ok(())
            })
            .with_rollover_reader(
                |input| Ok(OpaqueValue::new(input.read_string()?)),
                |value| value.downcast_ref::<String>().cloned().unwrap_or_default(),
            )
            .with_rollover_writer(|value, out| {
                out.write_string(value.downcast_ref::<String>().map(String::as_str).unwrap_or(""));
                Ok(())
            })
    }

    fn sample() -> IndexMetadata {
        IndexMetadata::builder("wire-test")
            .version(4)
            .routing_num_shards(2)
            .primary_terms(vec![1, 2])
            .settings(SettingsView::normalize(vec![("index.number_of_shards", json!("2"))]))
            .put_alias(AliasEntry::named("alias-1"))
            .put_in_sync_allocation_ids(1, ["x"])
            .put_custom_data("my_key", OpaqueValue::new(String::from("my_value")))
            .put_rollover_info("rollover_alias", OpaqueValue::new(String::from("rollover_alias")))
            .context(Some(ContextEntry::new("ctx", None, None)))
            .ingestion_paused(Some(false))
            .build()
    }

    #[test]
    fn test_full_mode_round_trip_reads_extensions() {
        let ext = string_ext();
        let md = sample();
        let bytes = md.to_bytes(WireVersion::CURRENT, &ext).unwrap();
        let read = IndexMetadata::from_bytes(&bytes, WireVersion::CURRENT, &ext).unwrap();

        assert_eq!(read, md);
        let custom = read.custom_data().unwrap();
        assert_eq!(custom["my_key"].downcast_ref::<String>().unwrap(), "my_value");
        let rollover = read.rollover_infos().unwrap();
        assert!(rollover.contains_key("rollover_alias"));
    }

    #[test]
    fn test_skip_mode_leaves_slots_absent() {
        let bytes = sample().to_bytes(WireVersion::CURRENT, &string_ext()).unwrap();
        let read = IndexMetadata::from_bytes(&bytes, WireVersion::CURRENT, &WireExtensions::none()).unwrap();

        assert_eq!(read, sample());
        assert!(read.custom_data().is_none());
        assert!(read.rollover_infos().is_none());
    }

    #[test]
    fn test_skip_below_threshold_is_configuration_error() {
        let old = WireVersion::new(3, 1, 0);
        let bytes = sample().to_bytes(old, &string_ext()).unwrap();
        let err = IndexMetadata::from_bytes(&bytes, old, &WireExtensions::none()).unwrap_err();
        assert_eq!(err.code(), crate::errors::ErrorCode::Configuration);

        // a reader makes the old layout decodable
        let read = IndexMetadata::from_bytes(&bytes, old, &string_ext()).unwrap();
        assert_eq!(read, sample());
    }

    #[test]
    fn test_empty_slots_decode_below_threshold_without_readers() {
        let old = WireVersion::new(3, 1, 0);
        let md = IndexMetadata::builder("no-ext").primary_terms(vec![1]).build();
        let bytes = md.to_bytes(old, &WireExtensions::none()).unwrap();
        assert_eq!(IndexMetadata::from_bytes(&bytes, old, &WireExtensions::none()).unwrap(), md);
    }

    #[test]
    fn test_version_gates_drop_newer_fields() {
        let md = sample();

        let v2_16 = WireVersion::new(2, 16, 0);
        let bytes = md.to_bytes(v2_16, &string_ext()).unwrap();
        let read = IndexMetadata::from_bytes(&bytes, v2_16, &string_ext()).unwrap();
        assert!(read.context().is_none());
        assert!(read.ingestion_paused().is_none());

        let v2_19 = WireVersion::new(2, 19, 0);
        let bytes = md.to_bytes(v2_19, &string_ext()).unwrap();
        let read = IndexMetadata::from_bytes(&bytes, v2_19, &string_ext()).unwrap();
        assert_eq!(read.context(), md.context());
        assert!(read.ingestion_paused().is_none());
    }

    #[test]
    fn test_truncated_skippable_entry_is_corruption() {
        let mut out = StreamOutput::new(WireVersion::CURRENT);
        out.write_vint(1);
        out.write_string("key");
        out.write_vint(50);
        out.write_bytes(b"short");
        let bytes = out.into_bytes();

        let mut input = StreamInput::new(&bytes, WireVersion::CURRENT);
        let builder = IndexMetadataBuilder::new("t");
        let err = read_custom_data(&mut input, &WireExtensions::none(), builder).unwrap_err();
        assert!(err.is_fatal());
    }
}
