//! Attendance and QR clock-in endpoints.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};

use super::{Endpoint, Mutation, Query, Tag};
use crate::api::{ApiError, ApiResponse, Method};
use crate::models::{AttendanceRecord, QrCode, ScanResult};
use crate::utils::DateRange;

#[derive(Debug, Clone, Serialize)]
pub struct ListAttendanceArgs {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl From<DateRange> for ListAttendanceArgs {
    fn from(range: DateRange) -> Self {
        Self {
            from: range.from,
            to: range.to,
        }
    }
}

pub struct ListAttendance;

impl Endpoint for ListAttendance {
    type Args = ListAttendanceArgs;
    type Response = ApiResponse<Vec<AttendanceRecord>>;

    const NAME: &'static str = "listAttendance";
    const METHOD: Method = Method::Get;

    fn path(_args: &ListAttendanceArgs) -> String {
        "/attendance".to_string()
    }

    fn query(args: &ListAttendanceArgs) -> Vec<(&'static str, String)> {
        vec![
            ("from", args.from.format("%Y-%m-%d").to_string()),
            ("to", args.to.format("%Y-%m-%d").to_string()),
        ]
    }

    fn validate(args: &ListAttendanceArgs) -> Result<(), ApiError> {
        if args.from > args.to {
            return Err(ApiError::InvalidRequest(format!(
                "range starts after it ends ({} > {})",
                args.from, args.to
            )));
        }
        Ok(())
    }
}

impl Query for ListAttendance {
    const PROVIDES: &'static [Tag] = &[Tag::Attendance];
}

/// Issues a fresh code for the current organization. Nothing cached depends
/// on it.
pub struct GenerateQrCode;

impl Endpoint for GenerateQrCode {
    type Args = ();
    type Response = ApiResponse<QrCode>;

    const NAME: &'static str = "generateQrCode";
    const METHOD: Method = Method::Post;

    fn path(_args: &()) -> String {
        "/attendance/qr".to_string()
    }
}

impl Mutation for GenerateQrCode {
    const INVALIDATES: &'static [Tag] = &[];
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanQrCodeArgs {
    pub code: String,
}

/// Clocks the signed-in user in or out; the server decides which.
pub struct ScanQrCode;

impl Endpoint for ScanQrCode {
    type Args = ScanQrCodeArgs;
    type Response = ApiResponse<ScanResult>;

    const NAME: &'static str = "scanQrCode";
    const METHOD: Method = Method::Post;

    fn path(_args: &ScanQrCodeArgs) -> String {
        "/attendance/scan".to_string()
    }

    fn body(args: &ScanQrCodeArgs) -> Result<Option<Value>, ApiError> {
        Ok(Some(json!({ "code": args.code.trim() })))
    }

    fn validate(args: &ScanQrCodeArgs) -> Result<(), ApiError> {
        if args.code.trim().is_empty() {
            return Err(ApiError::Validation("QR code is empty".to_string()));
        }
        Ok(())
    }
}

impl Mutation for ScanQrCode {
    const INVALIDATES: &'static [Tag] = &[Tag::Attendance, Tag::Shifts];
}
