//! Mapping Telegram attachments onto queue descriptors.

use teloxide::types::{FileMeta, MediaKind, Message, MessageKind};

use tgdrive_queue::{MediaDescriptor, SourceRef};

/// What a message carries, from the uploader's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    /// Media that can be queued.
    Media(MediaDescriptor),
    /// An attachment kind the uploader does not handle (sticker, poll, ...).
    Unsupported(&'static str),
    /// Plain text or a service message.
    None,
}

/// Extract the uploadable file from a message.
///
/// Photos use the largest available size. Kinds without a file name get a
/// synthetic one built from the file's unique ID.
pub fn describe(msg: &Message) -> Attachment {
    let MessageKind::Common(common) = &msg.kind else {
        return Attachment::None;
    };

    match &common.media_kind {
        MediaKind::Text(_) => Attachment::None,
        MediaKind::Document(d) => {
            let doc = &d.document;
            descriptor(
                &doc.file,
                doc.file_name.clone(),
                "document",
                "bin",
                doc.mime_type.as_ref().map(|m| m.to_string()),
                "application/octet-stream",
            )
        },
        MediaKind::Photo(p) => match p.photo.last() {
            Some(size) => descriptor(&size.file, None, "photo", "jpg", None, "image/jpeg"),
            None => Attachment::Unsupported("photo"),
        },
        MediaKind::Video(v) => {
            let video = &v.video;
            descriptor(
                &video.file,
                video.file_name.clone(),
                "video",
                "mp4",
                video.mime_type.as_ref().map(|m| m.to_string()),
                "video/mp4",
            )
        },
        MediaKind::Audio(a) => {
            let audio = &a.audio;
            descriptor(
                &audio.file,
                audio.file_name.clone(),
                "audio",
                "mp3",
                audio.mime_type.as_ref().map(|m| m.to_string()),
                "audio/mpeg",
            )
        },
        // Voice notes are always OGG Opus.
        MediaKind::Voice(v) => descriptor(&v.voice.file, None, "voice", "ogg", None, "audio/ogg"),
        MediaKind::VideoNote(v) => descriptor(
            &v.video_note.file,
            None,
            "video_note",
            "mp4",
            None,
            "video/mp4",
        ),
        MediaKind::Animation(a) => {
            let anim = &a.animation;
            descriptor(
                &anim.file,
                anim.file_name.clone(),
                "animation",
                "mp4",
                anim.mime_type.as_ref().map(|m| m.to_string()),
                "video/mp4",
            )
        },
        MediaKind::Contact(_) => Attachment::Unsupported("contact"),
        MediaKind::Location(_) => Attachment::Unsupported("location"),
        MediaKind::Poll(_) => Attachment::Unsupported("poll"),
        MediaKind::Sticker(_) => Attachment::Unsupported("sticker"),
        MediaKind::Venue(_) => Attachment::Unsupported("venue"),
        _ => Attachment::Unsupported("unknown media"),
    }
}

fn descriptor(
    file: &FileMeta,
    file_name: Option<String>,
    prefix: &str,
    extension: &str,
    mime_type: Option<String>,
    fallback_mime: &str,
) -> Attachment {
    let name = file_name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| format!("{prefix}_{}.{extension}", file.unique_id));
    let size = u64::from(file.size);
    Attachment::Media(MediaDescriptor {
        source: SourceRef::new(file.id.to_string()),
        name,
        content_type: mime_type.unwrap_or_else(|| fallback_mime.to_string()),
        size_bytes: (size > 0).then_some(size),
    })
}
