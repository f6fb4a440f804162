use uuid::Uuid;

/// Currency and language primary keys are 128-bit binary identifiers.
pub type DbId = Uuid;

/// Storage format for `created_at` columns (`DATETIME(3)`).
pub const STORAGE_DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Identifier reserved for the default (base) currency.
///
/// Exactly one `currency` row holds this id; its factor is always 1.
pub const DEFAULT_CURRENCY_ID: DbId = Uuid::from_u128(0xb7d2554b_0ce8_47cd_82f3_ac9bd1c0dfca);

/// Identifier of the system language new translations are bound to.
pub const SYSTEM_LANGUAGE_ID: DbId = Uuid::from_u128(0x2fbb5fe2_e29a_4d70_aa58_54ce7ce3e20b);

/// Generate a fresh random 128-bit identifier.
pub fn random_id() -> DbId {
    Uuid::new_v4()
}

/// Current time formatted for storage.
pub fn storage_now() -> String {
    chrono::Utc::now()
        .format(STORAGE_DATE_TIME_FORMAT)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_ids_match_their_hex_form() {
        assert_eq!(
            DEFAULT_CURRENCY_ID.simple().to_string(),
            "b7d2554b0ce847cd82f3ac9bd1c0dfca"
        );
        assert_eq!(
            SYSTEM_LANGUAGE_ID.simple().to_string(),
            "2fbb5fe2e29a4d70aa5854ce7ce3e20b"
        );
    }

    #[test]
    fn random_ids_are_v4_and_distinct() {
        let ids: std::collections::HashSet<DbId> = (0..64).map(|_| random_id()).collect();

        assert_eq!(ids.len(), 64);
        assert!(ids
            .iter()
            .all(|id| id.get_version() == Some(uuid::Version::Random)));
    }

    #[test]
    fn storage_timestamp_has_millisecond_precision() {
        let now = storage_now();
        // "YYYY-MM-DD HH:MM:SS.mmm"
        assert_eq!(now.len(), 23);
        assert_eq!(&now[10..11], " ");
    }
}
