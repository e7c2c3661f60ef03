//! Timeline annotations attached to playable items.
//!
//! Neither variant has a `key`; both are only ever built as children of a
//! movie or episode detail payload.

use mediagraph_core::prelude::*;
use serde_json::Value;

use crate::values::{int, text};

/// An intro, credits or commercial marker.
#[derive(Debug, Clone, Default)]
pub struct Marker {
    pub id: Option<i64>,
    pub kind: Option<String>,
    pub start_time_offset: Option<i64>,
    pub end_time_offset: Option<i64>,
    pub is_final: Option<bool>,
}

impl Marker {
    pub fn is_intro(&self) -> bool {
        self.kind.as_deref() == Some("intro")
    }

    pub fn is_credits(&self) -> bool {
        self.kind.as_deref() == Some("credits")
    }

    /// Length in milliseconds when both offsets are known and their
    /// difference fits.
    pub fn duration(&self) -> Option<i64> {
        self.end_time_offset?.checked_sub(self.start_time_offset?)
    }
}

impl Fields for Marker {
    const TAG: &'static str = "Marker";

    fn load(payload: &Payload<'_>) -> Self {
        Self {
            id: payload.int("id"),
            kind: payload.string("type"),
            start_time_offset: payload.int("startTimeOffset"),
            end_time_offset: payload.int("endTimeOffset"),
            is_final: payload.bool("final"),
        }
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => int(self.id),
            "type" => text(&self.kind),
            "startTimeOffset" => int(self.start_time_offset),
            "endTimeOffset" => int(self.end_time_offset),
            "final" => self.is_final.map(Value::from),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Chapter {
    pub id: Option<i64>,
    pub index: Option<i64>,
    pub title: Option<String>,
    pub start_time_offset: Option<i64>,
    pub end_time_offset: Option<i64>,
    pub thumb: Option<String>,
}

impl Fields for Chapter {
    const TAG: &'static str = "Chapter";

    fn load(payload: &Payload<'_>) -> Self {
        Self {
            id: payload.int("id"),
            index: payload.int("index"),
            title: payload.string("tag"),
            start_time_offset: payload.int("startTimeOffset"),
            end_time_offset: payload.int("endTimeOffset"),
            thumb: payload.string("thumb"),
        }
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => int(self.id),
            "index" => int(self.index),
            "tag" => text(&self.title),
            "startTimeOffset" => int(self.start_time_offset),
            "endTimeOffset" => int(self.end_time_offset),
            "thumb" => text(&self.thumb),
            _ => None,
        }
    }
}
