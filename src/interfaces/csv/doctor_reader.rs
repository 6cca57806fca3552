use crate::domain::doctor::DoctorSettlementProfile;
use crate::error::{PayoutError, Result};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct DoctorRecord {
    doctor_id: String,
    user_id: Option<String>,
    name: Option<String>,
    stripe_account_id: Option<String>,
    paypal_email: Option<String>,
    mpesa_phone_number: Option<String>,
    /// JSON object, e.g. `{"iban": "...", "bic": "..."}`.
    bank_details: Option<String>,
}

impl TryFrom<DoctorRecord> for DoctorSettlementProfile {
    type Error = PayoutError;

    fn try_from(record: DoctorRecord) -> Result<Self> {
        let bank_details = record
            .bank_details
            .map(|raw| serde_json::from_str(&raw))
            .transpose()?;

        Ok(Self {
            doctor_id: record.doctor_id,
            user_id: record.user_id,
            name: record.name,
            stripe_account_id: record.stripe_account_id,
            paypal_email: record.paypal_email,
            mpesa_phone_number: record.mpesa_phone_number,
            bank_details,
        })
    }
}

/// Reads doctor settlement profiles from a CSV source.
pub struct DoctorReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> DoctorReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn profiles(self) -> impl Iterator<Item = Result<DoctorSettlementProfile>> {
        self.reader
            .into_deserialize::<DoctorRecord>()
            .map(|result| {
                result
                    .map_err(PayoutError::from)
                    .and_then(DoctorSettlementProfile::try_from)
            })
    }
}
