// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use camera_session::constants::{MAX_RECORDING_DURATION, MEDIA_FILE_PREFIX, VideoQuality};
use camera_session::storage::destination_path;
use camera_session::MediaKind;
use std::path::Path;

#[test]
fn test_video_quality_values() {
    assert_eq!(VideoQuality::ALL.len(), 4);
    assert_eq!(VideoQuality::default(), VideoQuality::P1080);
}

#[test]
fn test_video_quality_ordering() {
    // Profiles are ordered from lowest to highest quality
    let mut prev = (0u32, 0u32);
    for quality in VideoQuality::ALL {
        let bitrate = quality.bitrate_kbps();
        let (width, _) = quality.dimensions();
        assert!(bitrate > prev.0, "{:?} bitrate out of order", quality);
        assert!(width > prev.1, "{:?} width out of order", quality);
        prev = (bitrate, width);
    }
}

#[test]
fn test_video_quality_display_names() {
    for quality in VideoQuality::ALL {
        assert!(
            !quality.display_name().is_empty(),
            "Quality {:?} has empty display name",
            quality
        );
    }
}

#[test]
fn test_gallery_naming() {
    assert_eq!(MAX_RECORDING_DURATION.as_secs(), 60);

    let photo = destination_path(Path::new("/gallery"), MediaKind::Photo, 42);
    let video = destination_path(Path::new("/gallery"), MediaKind::Video, 42);
    assert_eq!(photo, Path::new("/gallery").join(format!("{}42.jpg", MEDIA_FILE_PREFIX)));
    assert_eq!(video, Path::new("/gallery/media_42.mp4"));
}
