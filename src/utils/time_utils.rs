//! `chrono::DateTime<Utc>` ↔ BSON DateTime 직렬화 헬퍼
//!
//! 엔티티는 chrono 타입을 쓰고, MongoDB에는 네이티브 날짜로 저장되어
//! 범위 조회와 TTL 인덱스가 동작합니다.
//!
//! ```rust,ignore
//! #[serde(with = "crate::utils::time_utils::bson_datetime")]
//! pub created_at: DateTime<Utc>,
//! ```

pub mod bson_datetime {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        mongodb::bson::DateTime::from_millis(value.timestamp_millis()).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let value = mongodb::bson::DateTime::deserialize(deserializer)?;
        DateTime::<Utc>::from_timestamp_millis(value.timestamp_millis())
            .ok_or_else(|| serde::de::Error::custom("timestamp out of range"))
    }
}

pub mod bson_datetime_opt {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error> {
        value
            .map(|v| mongodb::bson::DateTime::from_millis(v.timestamp_millis()))
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        let value = Option::<mongodb::bson::DateTime>::deserialize(deserializer)?;
        value
            .map(|v| {
                DateTime::<Utc>::from_timestamp_millis(v.timestamp_millis())
                    .ok_or_else(|| serde::de::Error::custom("timestamp out of range"))
            })
            .transpose()
    }
}

/// 쿼리 필터용 BSON 날짜 변환
pub fn to_bson(value: chrono::DateTime<chrono::Utc>) -> mongodb::bson::DateTime {
    mongodb::bson::DateTime::from_millis(value.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use mongodb::bson;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Probe {
        #[serde(with = "super::bson_datetime")]
        at: DateTime<Utc>,
        #[serde(default, with = "super::bson_datetime_opt")]
        maybe: Option<DateTime<Utc>>,
    }

    #[test]
    fn test_stored_as_native_bson_date() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let doc = bson::to_document(&Probe { at, maybe: None }).unwrap();

        assert!(matches!(doc.get("at"), Some(bson::Bson::DateTime(_))));
        assert!(matches!(doc.get("maybe"), Some(bson::Bson::Null)));

        let back: Probe = bson::from_document(doc).unwrap();
        assert_eq!(back.at, at);
        assert_eq!(back.maybe, None);
    }
}
