//! Shift scheduling endpoints.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use serde_json::{json, Value};

use super::{json_body, segment, Endpoint, Mutation, Query, Tag};
use crate::api::{Ack, ApiError, ApiResponse, Method};
use crate::models::{ShiftInstance, ShiftPattern};
use crate::utils::DateRange;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Serialize)]
pub struct ListShiftsArgs {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl From<DateRange> for ListShiftsArgs {
    fn from(range: DateRange) -> Self {
        Self {
            from: range.from,
            to: range.to,
        }
    }
}

pub struct ListShifts;

impl Endpoint for ListShifts {
    type Args = ListShiftsArgs;
    type Response = ApiResponse<Vec<ShiftInstance>>;

    const NAME: &'static str = "listShifts";
    const METHOD: Method = Method::Get;

    fn path(_args: &ListShiftsArgs) -> String {
        "/shifts".to_string()
    }

    fn query(args: &ListShiftsArgs) -> Vec<(&'static str, String)> {
        vec![
            ("from", args.from.format(DATE_FORMAT).to_string()),
            ("to", args.to.format(DATE_FORMAT).to_string()),
        ]
    }

    fn validate(args: &ListShiftsArgs) -> Result<(), ApiError> {
        if args.from > args.to {
            return Err(ApiError::InvalidRequest(format!(
                "range starts after it ends ({} > {})",
                args.from, args.to
            )));
        }
        Ok(())
    }
}

impl Query for ListShifts {
    const PROVIDES: &'static [Tag] = &[Tag::Shifts];
}

pub struct ListShiftPatterns;

impl Endpoint for ListShiftPatterns {
    type Args = ();
    type Response = ApiResponse<Vec<ShiftPattern>>;

    const NAME: &'static str = "listShiftPatterns";
    const METHOD: Method = Method::Get;

    fn path(_args: &()) -> String {
        "/shift-patterns".to_string()
    }
}

impl Query for ListShiftPatterns {
    const PROVIDES: &'static [Tag] = &[Tag::ShiftPatterns];
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewShiftPattern {
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

pub struct CreateShiftPattern;

impl Endpoint for CreateShiftPattern {
    type Args = NewShiftPattern;
    type Response = ApiResponse<ShiftPattern>;

    const NAME: &'static str = "createShiftPattern";
    const METHOD: Method = Method::Post;

    fn path(_args: &NewShiftPattern) -> String {
        "/shift-patterns".to_string()
    }

    fn body(args: &NewShiftPattern) -> Result<Option<Value>, ApiError> {
        json_body(Self::NAME, args)
    }

    fn validate(args: &NewShiftPattern) -> Result<(), ApiError> {
        if args.name.trim().is_empty() {
            return Err(ApiError::Validation("Pattern name is required".to_string()));
        }
        if args.start_time == args.end_time {
            return Err(ApiError::Validation(
                "A shift cannot start and end at the same time".to_string(),
            ));
        }
        Ok(())
    }
}

impl Mutation for CreateShiftPattern {
    const INVALIDATES: &'static [Tag] = &[Tag::ShiftPatterns];
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewShift {
    pub date: NaiveDate,
    pub pattern_id: String,
    pub count: u32,
}

pub struct CreateShift;

impl Endpoint for CreateShift {
    type Args = NewShift;
    type Response = ApiResponse<ShiftInstance>;

    const NAME: &'static str = "createShift";
    const METHOD: Method = Method::Post;

    fn path(_args: &NewShift) -> String {
        "/shifts".to_string()
    }

    fn body(args: &NewShift) -> Result<Option<Value>, ApiError> {
        Ok(Some(json!({
            "date": args.date.format(DATE_FORMAT).to_string(),
            "patternId": args.pattern_id,
            "count": args.count,
        })))
    }

    fn validate(args: &NewShift) -> Result<(), ApiError> {
        if args.count == 0 {
            return Err(ApiError::Validation("A shift needs at least one slot".to_string()));
        }
        Ok(())
    }
}

impl Mutation for CreateShift {
    const INVALIDATES: &'static [Tag] = &[Tag::Shifts];
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignStaffArgs {
    pub shift_id: String,
    pub user_ids: Vec<String>,
    /// Open slots as last seen by the client, for the soft capacity check.
    #[serde(skip)]
    pub open_slots: Option<u32>,
}

impl AssignStaffArgs {
    /// Assignment against a shift the client has loaded, so the request can
    /// be refused locally when it would overfill the shift.
    pub fn for_shift(shift: &ShiftInstance, user_ids: Vec<String>) -> Self {
        Self {
            shift_id: shift.id.clone(),
            user_ids,
            open_slots: Some(shift.open_slots()),
        }
    }
}

pub struct AssignStaff;

impl Endpoint for AssignStaff {
    type Args = AssignStaffArgs;
    type Response = ApiResponse<ShiftInstance>;

    const NAME: &'static str = "assignStaff";
    const METHOD: Method = Method::Post;

    fn path(args: &AssignStaffArgs) -> String {
        format!("/shifts/{}/assign", segment(&args.shift_id))
    }

    fn body(args: &AssignStaffArgs) -> Result<Option<Value>, ApiError> {
        Ok(Some(json!({ "userIds": args.user_ids })))
    }

    fn validate(args: &AssignStaffArgs) -> Result<(), ApiError> {
        if args.user_ids.is_empty() {
            return Err(ApiError::Validation("Select at least one staff member".to_string()));
        }
        if let Some(open) = args.open_slots {
            if args.user_ids.len() > open as usize {
                return Err(ApiError::Validation(format!(
                    "Shift has {} open slot(s), cannot assign {}",
                    open,
                    args.user_ids.len()
                )));
            }
        }
        Ok(())
    }
}

impl Mutation for AssignStaff {
    const INVALIDATES: &'static [Tag] = &[Tag::Shifts];
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnassignStaffArgs {
    pub shift_id: String,
    pub user_id: String,
}

pub struct UnassignStaff;

impl Endpoint for UnassignStaff {
    type Args = UnassignStaffArgs;
    type Response = ApiResponse<ShiftInstance>;

    const NAME: &'static str = "unassignStaff";
    const METHOD: Method = Method::Post;

    fn path(args: &UnassignStaffArgs) -> String {
        format!("/shifts/{}/unassign", segment(&args.shift_id))
    }

    fn body(args: &UnassignStaffArgs) -> Result<Option<Value>, ApiError> {
        Ok(Some(json!({ "userId": args.user_id })))
    }
}

impl Mutation for UnassignStaff {
    const INVALIDATES: &'static [Tag] = &[Tag::Shifts];
}

/// Args: shift id.
pub struct DeleteShift;

impl Endpoint for DeleteShift {
    type Args = String;
    type Response = Ack;

    const NAME: &'static str = "deleteShift";
    const METHOD: Method = Method::Delete;

    fn path(shift_id: &String) -> String {
        format!("/shifts/{}", segment(shift_id))
    }
}

impl Mutation for DeleteShift {
    const INVALIDATES: &'static [Tag] = &[Tag::Shifts];
}
