use crate::domain::profile::{Profile, ProfileId, ProfileKind};
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct ProfileRow {
    id: ProfileId,
    #[serde(rename = "type")]
    kind: ProfileKind,
    balance: String,
}

impl From<&Profile> for ProfileRow {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id,
            kind: profile.kind,
            balance: profile.balance.to_string(),
        }
    }
}

/// Writes final profile balances as CSV (`id,type,balance`).
pub struct ProfileWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ProfileWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_profiles(&mut self, profiles: &[Profile]) -> Result<()> {
        for profile in profiles {
            self.writer.serialize(ProfileRow::from(profile))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
