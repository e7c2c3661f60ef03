//! Media versions and their file parts.

use std::sync::Arc;

use mediagraph_core::prelude::*;
use serde_json::Value;

use crate::values::{float, int, text};

/// One encoded version of a playable item.
#[derive(Debug)]
pub struct Media {
    pub id: Option<i64>,
    pub duration: Option<i64>,
    pub bitrate: Option<i64>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub aspect_ratio: Option<f64>,
    pub audio_channels: Option<i64>,
    pub audio_codec: Option<String>,
    pub video_codec: Option<String>,
    pub video_resolution: Option<String>,
    pub video_frame_rate: Option<String>,
    pub container: Option<String>,
    pub parts: Vec<Arc<Node<Part>>>,
}

impl Fields for Media {
    const TAG: &'static str = "Media";

    fn load(payload: &Payload<'_>) -> Self {
        Self {
            id: payload.int("id"),
            duration: payload.int("duration"),
            bitrate: payload.int("bitrate"),
            width: payload.int("width"),
            height: payload.int("height"),
            aspect_ratio: payload.float("aspectRatio"),
            audio_channels: payload.int("audioChannels"),
            audio_codec: payload.string("audioCodec"),
            video_codec: payload.string("videoCodec"),
            video_resolution: payload.string("videoResolution"),
            video_frame_rate: payload.string("videoFrameRate"),
            container: payload.string("container"),
            parts: payload.children::<Part>(),
        }
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => int(self.id),
            "duration" => int(self.duration),
            "bitrate" => int(self.bitrate),
            "width" => int(self.width),
            "height" => int(self.height),
            "aspectRatio" => float(self.aspect_ratio),
            "audioChannels" => int(self.audio_channels),
            "audioCodec" => text(&self.audio_codec),
            "videoCodec" => text(&self.video_codec),
            "videoResolution" => text(&self.video_resolution),
            "videoFrameRate" => text(&self.video_frame_rate),
            "container" => text(&self.container),
            _ => None,
        }
    }
}

/// A file backing a [`Media`] version. Its key is a download path.
#[derive(Debug)]
pub struct Part {
    pub id: Option<i64>,
    pub file: Option<String>,
    pub size: Option<i64>,
    pub duration: Option<i64>,
    pub container: Option<String>,
}

impl Fields for Part {
    const TAG: &'static str = "Part";

    fn load(payload: &Payload<'_>) -> Self {
        Self {
            id: payload.int("id"),
            file: payload.string("file"),
            size: payload.int("size"),
            duration: payload.int("duration"),
            container: payload.string("container"),
        }
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => int(self.id),
            "file" => text(&self.file),
            "size" => int(self.size),
            "duration" => int(self.duration),
            "container" => text(&self.container),
            _ => None,
        }
    }
}

/// File paths of every part of every media version.
pub(crate) fn files(media: &[Arc<Node<Media>>]) -> Vec<String> {
    media
        .iter()
        .flat_map(|version| {
            version
                .read()
                .parts
                .iter()
                .filter_map(|part| part.read().file.clone())
                .collect::<Vec<_>>()
        })
        .collect()
}
