//! ID3 tag construction for FFmpeg's `-metadata` arguments.

/// Tags written to every exported MP3.
#[derive(Debug, Clone)]
pub struct TrackTags {
    /// Album name
    pub album: String,
    /// Artist (the manuscript author)
    pub artist: String,
    /// Track title
    pub title: String,
}

impl TrackTags {
    /// Create a new tag set.
    pub fn new(album: impl Into<String>, artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            album: album.into(),
            artist: artist.into(),
            title: title.into(),
        }
    }

    /// FFmpeg arguments writing these tags as ID3v2.3.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let mut args = vec!["-id3v2_version".to_string(), "3".to_string()];

        for (key, value) in [
            ("album", &self.album),
            ("artist", &self.artist),
            ("title", &self.title),
        ] {
            args.push("-metadata".to_string());
            args.push(format!("{}={}", key, clean_tag_value(value)));
        }

        args
    }
}

/// Tag values are passed as single arguments, so only line breaks and
/// whitespace runs need flattening.
fn clean_tag_value(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_args() {
        let tags = TrackTags::new("My Album", "Some Author", "Chapter 1");
        let args = tags.to_ffmpeg_args();

        assert_eq!(args[0], "-id3v2_version");
        assert_eq!(args[1], "3");
        assert!(args.contains(&"album=My Album".to_string()));
        assert!(args.contains(&"artist=Some Author".to_string()));
        assert!(args.contains(&"title=Chapter 1".to_string()));
    }

    #[test]
    fn test_tag_values_keep_special_characters() {
        let tags = TrackTags::new("A & B", "O'Neill", "Luku 1: Alku");
        let args = tags.to_ffmpeg_args();
        assert!(args.contains(&"album=A & B".to_string()));
        assert!(args.contains(&"title=Luku 1: Alku".to_string()));
    }

    #[test]
    fn test_line_breaks_flattened() {
        assert_eq!(clean_tag_value("one\ntwo\r\nthree"), "one two three");
    }
}
