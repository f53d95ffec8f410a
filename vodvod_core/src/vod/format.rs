use super::model::Vod;

/// `HH:MM:SS`, or `?:??:??` when the duration is unknown.
///
/// Fractions are floored here and nowhere earlier, so a clip shorter than a
/// second still shows as `00:00:00`.
pub fn format_duration(seconds: f64) -> String {
    if !(seconds.is_finite() && seconds > 0.0) {
        return "?:??:??".to_string();
    }
    let total = seconds.floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// VODs whose title, streamer or game contains `term`, case-insensitively.
/// A blank term matches everything.
pub fn filter_vods<'a>(vods: &'a [Vod], term: &str) -> Vec<&'a Vod> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return vods.iter().collect();
    }

    vods.iter()
        .filter(|vod| {
            // Raw fields only; the display placeholders must not match.
            let meta = vod.metadata.as_ref();
            [
                meta.and_then(|m| m.title_at_start.as_deref()),
                meta.and_then(|m| m.streamer_login_at_start.as_deref()),
                meta.and_then(|m| m.game_name_at_start.as_deref()),
            ]
            .iter()
            .any(|field| field.unwrap_or("").to_lowercase().contains(&term))
        })
        .collect()
}

/// Filename offered when saving a VOD: `"{streamer} - {title}.{ext}"`, with
/// the extension taken from the link path (default `mp4`).
pub fn suggested_filename(vod: &Vod) -> String {
    let stem = sanitize_filename(&format!("{} - {}", vod.streamer(), vod.title()));
    let ext = link_extension(&vod.link).unwrap_or("mp4");
    format!("{}.{}", stem, ext)
}

fn link_extension(link: &str) -> Option<&str> {
    let path = link.split(['?', '#']).next().unwrap_or(link);
    let last = path.rsplit('/').next()?;
    let (_, ext) = last.rsplit_once('.')?;
    let valid = !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then_some(ext)
}

/// Replaces characters that are unsafe in filenames on common platforms.
fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if trimmed.is_empty() {
        "vod".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vod::model::VodMetadata;

    fn vod(link: &str, title: &str, streamer: &str, game: &str) -> Vod {
        Vod {
            link: link.to_string(),
            metadata: Some(VodMetadata {
                title_at_start: Some(title.to_string()),
                streamer_login_at_start: Some(streamer.to_string()),
                game_name_at_start: Some(game.to_string()),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "?:??:??");
        assert_eq!(format_duration(-3.0), "?:??:??");
        assert_eq!(format_duration(f64::NAN), "?:??:??");
        assert_eq!(format_duration(0.4), "00:00:00");
        assert_eq!(format_duration(59.0), "00:00:59");
        assert_eq!(format_duration(3725.9), "01:02:05");
        assert_eq!(format_duration(360_000.0), "100:00:00");
    }

    #[test]
    fn test_filter_matches_title_streamer_or_game() {
        let vods = vec![
            vod("/1", "Any% attempts", "runner", "Celeste"),
            vod("/2", "Chill stream", "painter", "Krita"),
            vod("/3", "Ranked", "RUNNER2", "Chess"),
        ];

        let by_streamer: Vec<_> = filter_vods(&vods, "Runner").iter().map(|v| v.link.as_str()).collect();
        assert_eq!(by_streamer, vec!["/1", "/3"]);

        let by_game: Vec<_> = filter_vods(&vods, " krita ").iter().map(|v| v.link.as_str()).collect();
        assert_eq!(by_game, vec!["/2"]);

        let by_title: Vec<_> = filter_vods(&vods, "any%").iter().map(|v| v.link.as_str()).collect();
        assert_eq!(by_title, vec!["/1"]);

        assert_eq!(filter_vods(&vods, "   ").len(), 3);
        assert!(filter_vods(&vods, "nothing").is_empty());
    }

    #[test]
    fn test_filter_ignores_display_placeholders() {
        let bare = Vod {
            link: "/bare".to_string(),
            metadata: None,
        };
        let vods = vec![bare, vod("/named", "Speedrun", "runner", "Celeste")];

        assert!(filter_vods(&vods, "unknown").is_empty());
        assert!(filter_vods(&vods, "unnamed stream").is_empty());

        let hits: Vec<_> = filter_vods(&vods, "run").iter().map(|v| v.link.as_str()).collect();
        assert_eq!(hits, vec!["/named"]);
        assert_eq!(filter_vods(&vods, "").len(), 2);
    }

    #[test]
    fn test_suggested_filename() {
        let v = vod("/vods/1/index.m3u8?x=1", "Big: run/attempt", "runner", "Celeste");
        assert_eq!(suggested_filename(&v), "runner - Big_ run_attempt.m3u8");

        let v = vod("/vods/2/stream", "Night", "owl", "Chess");
        assert_eq!(suggested_filename(&v), "owl - Night.mp4");
    }
}
