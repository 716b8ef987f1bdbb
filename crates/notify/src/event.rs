//! Upload notification message model and parsing.

use crate::error::{NotifyError, NotifyResult};
use crate::queue::QueueMessage;
use cabinet_core::{ObjectKey, STORAGE_VERIFY_PREFIX};
use serde::Deserialize;

/// Wire shape of an upload notification: the storage layer's object-created
/// event, optionally annotated by the malware scanner with a `scan_status`.
#[derive(Debug, Deserialize)]
pub struct UploadNotification {
    #[serde(rename = "Records", alias = "records", default)]
    pub records: Vec<EventRecord>,
}

#[derive(Debug, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "s3")]
    pub storage: StorageRecord,
    #[serde(default)]
    pub scan_status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StorageRecord {
    #[serde(default)]
    pub bucket: BucketRecord,
    pub object: ObjectRecord,
}

#[derive(Debug, Default, Deserialize)]
pub struct BucketRecord {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ObjectRecord {
    pub key: String,
    #[serde(default)]
    pub size: i64,
}

/// Scan verdict attached to an upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanStatus {
    Clean,
    Quarantined,
}

/// A notification resolved to a file status transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_id: i64,
    pub size: i64,
    pub scan_status: ScanStatus,
}

/// What a received message turned out to be.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParsedEvent {
    /// A real upload; apply the status transition.
    Upload(UploadedFile),
    /// A storage connectivity probe object; acknowledge and discard.
    VerificationProbe,
}

/// Classify a queue message.
///
/// `Ok(None)` means the body parsed but carried no records (e.g. the
/// channel's own test events); such messages are left for the channel to
/// redeliver and eventually dead-letter. Errors mean the message is malformed
/// or carries an unexpected key and must NOT be acknowledged.
pub fn classify(message: &QueueMessage) -> NotifyResult<Option<ParsedEvent>> {
    let notification: UploadNotification = serde_json::from_str(&message.body)
        .map_err(|e| NotifyError::Malformed(e.to_string()))?;

    let Some(record) = notification.records.first() else {
        return Ok(None);
    };

    let key = &record.storage.object.key;
    let object = match ObjectKey::parse(key) {
        Ok(object) => object,
        Err(_) if key.starts_with(STORAGE_VERIFY_PREFIX) => {
            return Ok(Some(ParsedEvent::VerificationProbe));
        }
        Err(_) => {
            return Err(NotifyError::UnexpectedKey(key.clone()));
        }
    };

    let scan_status = match record.scan_status.as_deref() {
        // Channels without a scanner omit the field; an uploaded object with
        // no verdict is treated as clean.
        None | Some("") => {
            tracing::info!(file_id = object.file_id, "Empty scan status, marking file as clean");
            ScanStatus::Clean
        }
        Some("clean") => ScanStatus::Clean,
        Some("quarantined") => ScanStatus::Quarantined,
        Some(other) => return Err(NotifyError::UnknownScanStatus(other.to_string())),
    };

    Ok(Some(ParsedEvent::Upload(UploadedFile {
        file_id: object.file_id,
        size: record.storage.object.size,
        scan_status,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Captured from a storage bucket configured to queue an event per upload,
    // trimmed to the fields the service reads plus typical noise.
    const S3_EVENT_JSON: &str = r#"{"Records":[{"eventVersion":"2.1","eventSource":"aws:s3","awsRegion":"us-west-2","eventName":"ObjectCreated:Put","s3":{"s3SchemaVersion":"1.0","bucket":{"name":"cabinet-bucket-2","arn":"arn:aws:s3:::cabinet-bucket-2"},"object":{"key":"fe6671ca-78de-4b19-9cd1-9e5247c2379e/f10348dd-e57d-47bf-8f35-b2b02ea23ec2/5","size":10,"eTag":"2c3a70806465ad43c09fd387e659fbce","sequencer":"0064069E775BC1AFC3"}},"scan_status":"clean"}]}"#;

    fn message(body: &str) -> QueueMessage {
        QueueMessage {
            body: body.to_string(),
            receipt: "r-1".to_string(),
        }
    }

    #[test]
    fn parses_s3_event_format() {
        let notification: UploadNotification = serde_json::from_str(S3_EVENT_JSON).unwrap();
        assert_eq!(notification.records.len(), 1);
        let record = &notification.records[0];
        assert_eq!(record.storage.bucket.name, "cabinet-bucket-2");
        assert_eq!(record.storage.object.size, 10);
        assert_eq!(record.scan_status.as_deref(), Some("clean"));
    }

    #[test]
    fn classifies_clean_upload() {
        let parsed = classify(&message(S3_EVENT_JSON)).unwrap().unwrap();
        assert_eq!(
            parsed,
            ParsedEvent::Upload(UploadedFile {
                file_id: 5,
                size: 10,
                scan_status: ScanStatus::Clean,
            })
        );
    }

    fn event_with_key(key: &str, scan_status: Option<&str>) -> String {
        let scan = match scan_status {
            Some(s) => format!(r#","scan_status":"{s}""#),
            None => String::new(),
        };
        format!(
            r#"{{"Records":[{{"s3":{{"object":{{"key":"{key}","size":42}}}}{scan}}}]}}"#
        )
    }

    #[test]
    fn missing_scan_status_defaults_to_clean() {
        let parsed = classify(&message(&event_with_key("t/d/9", None)))
            .unwrap()
            .unwrap();
        match parsed {
            ParsedEvent::Upload(upload) => assert_eq!(upload.scan_status, ScanStatus::Clean),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn quarantined_scan_status_maps_through() {
        let parsed = classify(&message(&event_with_key("t/d/9", Some("quarantined"))))
            .unwrap()
            .unwrap();
        match parsed {
            ParsedEvent::Upload(upload) => {
                assert_eq!(upload.scan_status, ScanStatus::Quarantined)
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn unknown_scan_status_is_an_error() {
        let err = classify(&message(&event_with_key("t/d/9", Some("infected")))).unwrap_err();
        assert!(matches!(err, NotifyError::UnknownScanStatus(_)));
    }

    #[test]
    fn verification_probe_is_recognized() {
        let parsed = classify(&message(&event_with_key("storage_verify-1729.txt", None)))
            .unwrap()
            .unwrap();
        assert_eq!(parsed, ParsedEvent::VerificationProbe);
    }

    #[test]
    fn single_segment_key_is_unexpected() {
        let err = classify(&message(&event_with_key("justonepart", None))).unwrap_err();
        assert!(matches!(err, NotifyError::UnexpectedKey(_)));
    }

    #[test]
    fn unparseable_body_is_malformed() {
        let err = classify(&message("not json")).unwrap_err();
        assert!(matches!(err, NotifyError::Malformed(_)));
    }

    #[test]
    fn recordless_body_is_skipped() {
        assert_eq!(classify(&message(r#"{"Records":[]}"#)).unwrap(), None);
        assert_eq!(
            classify(&message(r#"{"Event":"s3:TestEvent"}"#)).unwrap(),
            None
        );
    }

    #[test]
    fn lowercase_records_alias_is_accepted() {
        let body = r#"{"records":[{"s3":{"object":{"key":"t/d/3","size":1}}}]}"#;
        let parsed = classify(&message(body)).unwrap().unwrap();
        match parsed {
            ParsedEvent::Upload(upload) => assert_eq!(upload.file_id, 3),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
