use regex::Regex;
use std::sync::LazyLock;

/// Pre-compiled regex patterns for title parsing
pub struct Patterns {
    // Episode patterns (ordered by precedence)
    pub episode_marker: Regex, // EP 4, Épisode: 12, Session 03
    pub number_marker: Regex,  // #4, N°4, No. 4
    pub fraction: Regex,       // 3/20

    // Series naming
    pub series_prefix: Regex, // "Série:", "Serie :", "Series:"
    pub fragment_separators: &'static [char],

    // Markup cleanup
    pub script_block: Regex,
    pub html_tag: Regex,

    // Embedded media in post HTML (ordered by precedence)
    pub audio_src: Regex,        // <audio src="...">
    pub audio_source_src: Regex, // <audio><source src="..."></audio>
    pub mp3_link: Regex,
    pub video_src: Regex,
    pub video_source_src: Regex,
    pub mp4_link: Regex,
    pub iframe_src: Regex,
}

impl Patterns {
    pub fn new() -> Self {
        Self {
            // Longer alternatives first so "EPISODE" is not read as "EP"
            episode_marker: Regex::new(
                r"(?i)\b(?:ÉPISODE|EPISODE|ÉP|EPI|EP|SESSION|PARTIE|PART|LEÇON|LECON)\s*[:\-]?\s*0*(\d+)",
            )
            .expect("Invalid episode_marker regex"),
            number_marker: Regex::new(r"(?i)(?:#|N[°º]|\bNo\.?)\s*0*(\d+)")
                .expect("Invalid number_marker regex"),
            fraction: Regex::new(r"\b0*(\d{1,4})\s*/\s*0*(\d{1,4})\b")
                .expect("Invalid fraction regex"),

            series_prefix: Regex::new(r"(?i)^\s*s[ée]ries?\s*:\s*")
                .expect("Invalid series_prefix regex"),
            fragment_separators: &['|', '-', '–', '—', ':'],

            script_block: Regex::new(r"(?is)<script[^>]*>.*?</script>|<style[^>]*>.*?</style>")
                .expect("Invalid script_block regex"),
            html_tag: Regex::new(r"<[^>]*>").expect("Invalid html_tag regex"),

            audio_src: Regex::new(r#"(?i)<audio[^>]*\ssrc=["']([^"']+)["'][^>]*>"#)
                .expect("Invalid audio_src regex"),
            audio_source_src: Regex::new(
                r#"(?is)<audio.*?<source[^>]*\ssrc=["']([^"']+)["'][^>]*>.*?</audio>"#,
            )
            .expect("Invalid audio_source_src regex"),
            mp3_link: Regex::new(r#"(?i)https?://[^\s"'<>]+\.mp3(?:\?[^\s"'<>]+)?"#)
                .expect("Invalid mp3_link regex"),
            video_src: Regex::new(r#"(?i)<video[^>]*\ssrc=["']([^"']+\.mp4(?:\?[^"']+)?)["'][^>]*>"#)
                .expect("Invalid video_src regex"),
            video_source_src: Regex::new(
                r#"(?i)<source[^>]*\ssrc=["']([^"']+\.mp4(?:\?[^"']+)?)["'][^>]*>"#,
            )
            .expect("Invalid video_source_src regex"),
            mp4_link: Regex::new(r#"(?i)https?://[^\s"'<>]+\.mp4(?:\?[^\s"'<>]+)?"#)
                .expect("Invalid mp4_link regex"),
            iframe_src: Regex::new(r#"(?i)<iframe[^>]*\ssrc=["']([^"']+)["'][^>]*>"#)
                .expect("Invalid iframe_src regex"),
        }
    }
}

impl Default for Patterns {
    fn default() -> Self {
        Self::new()
    }
}

/// Global singleton for patterns
pub static PATTERNS: LazyLock<Patterns> = LazyLock::new(Patterns::new);
