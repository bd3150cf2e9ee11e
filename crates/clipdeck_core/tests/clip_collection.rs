use chrono::{TimeZone, Utc};
use clipdeck_core::{arrange, format_duration, format_views, game_choices, Clip, ClipQuery, SortKey};

fn clip(id: &str, views: u64) -> Clip {
    Clip {
        id: id.to_string(),
        title: format!("clip {id}"),
        creator_name: "editor".to_string(),
        broadcaster_name: "someone".to_string(),
        game_name: "Valorant".to_string(),
        view_count: views,
        playback_url: format!("https://clips.example.com/{id}"),
        embed_url: format!("https://embed.example.com/?clip={id}"),
        ..Clip::default()
    }
}

fn ids(clips: &[&Clip]) -> Vec<String> {
    clips.iter().map(|clip| clip.id.clone()).collect()
}

#[test]
fn sort_by_views_is_descending() {
    let clips = vec![clip("a", 10), clip("b", 1000), clip("c", 500)];
    let arranged = arrange(&clips, &ClipQuery::default());

    let views: Vec<u64> = arranged.iter().map(|clip| clip.view_count).collect();
    assert_eq!(views, vec![1000, 500, 10]);
}

#[test]
fn sort_by_date_puts_newest_first_and_undated_last() {
    let mut old = clip("old", 1);
    old.created_at = Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    let mut new = clip("new", 1);
    new.created_at = Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
    let undated = clip("undated", 1);
    let clips = vec![old, undated, new];

    let query = ClipQuery {
        sort_key: SortKey::Date,
        ..ClipQuery::default()
    };
    assert_eq!(ids(&arrange(&clips, &query)), vec!["new", "old", "undated"]);
}

#[test]
fn sort_by_duration_is_descending_and_stable() {
    let mut a = clip("a", 1);
    a.duration_seconds = 30;
    let mut b = clip("b", 1);
    b.duration_seconds = 60;
    let mut c = clip("c", 1);
    c.duration_seconds = 30;
    let clips = vec![a, b, c];

    let query = ClipQuery {
        sort_key: SortKey::Duration,
        ..ClipQuery::default()
    };
    assert_eq!(ids(&arrange(&clips, &query)), vec!["b", "a", "c"]);
}

#[test]
fn search_is_case_insensitive_across_title_creator_and_broadcaster() {
    let mut by_broadcaster = clip("1", 5);
    by_broadcaster.broadcaster_name = "Shroud".to_string();
    let mut by_title = clip("2", 4);
    by_title.title = "SHROUD clutch".to_string();
    let mut by_creator = clip("3", 3);
    by_creator.creator_name = "shroudfan".to_string();
    let unrelated = clip("4", 2);
    let clips = vec![by_broadcaster, by_title, by_creator, unrelated];

    let query = ClipQuery {
        search_text: "shroud".to_string(),
        ..ClipQuery::default()
    };
    assert_eq!(ids(&arrange(&clips, &query)), vec!["1", "2", "3"]);
}

#[test]
fn game_filter_matches_exactly() {
    let mut fortnite = clip("f", 1);
    fortnite.game_name = "Fortnite".to_string();
    let clips = vec![clip("v", 2), fortnite];

    let query = ClipQuery {
        game_filter: "Fortnite".to_string(),
        ..ClipQuery::default()
    };
    assert_eq!(ids(&arrange(&clips, &query)), vec!["f"]);

    let query = ClipQuery {
        game_filter: "fortnite".to_string(),
        ..ClipQuery::default()
    };
    assert!(arrange(&clips, &query).is_empty());
}

#[test]
fn search_and_game_filter_combine() {
    let mut hit = clip("hit", 1);
    hit.title = "ace".to_string();
    let mut wrong_game = clip("wrong", 1);
    wrong_game.title = "ace".to_string();
    wrong_game.game_name = "Minecraft".to_string();
    let clips = vec![hit, wrong_game];

    let query = ClipQuery {
        search_text: "ACE".to_string(),
        game_filter: "Valorant".to_string(),
        sort_key: SortKey::Views,
    };
    assert_eq!(ids(&arrange(&clips, &query)), vec!["hit"]);
}

#[test]
fn arrange_is_pure() {
    let clips = vec![clip("a", 10), clip("b", 1000), clip("c", 500)];
    let before = clips.clone();
    let query = ClipQuery {
        search_text: "clip".to_string(),
        ..ClipQuery::default()
    };

    let first = ids(&arrange(&clips, &query));
    let second = ids(&arrange(&clips, &query));

    assert_eq!(first, second);
    assert_eq!(clips, before);
}

#[test]
fn empty_input_yields_empty_output() {
    assert!(arrange(&[], &ClipQuery::default()).is_empty());
    assert!(game_choices(&[]).is_empty());
}

#[test]
fn game_choices_are_distinct_sorted_and_ignore_filters() {
    let mut a = clip("a", 1);
    a.game_name = "Valorant".to_string();
    let mut b = clip("b", 1);
    b.game_name = "Apex Legends".to_string();
    let mut c = clip("c", 1);
    c.game_name = "Valorant".to_string();
    let mut d = clip("d", 1);
    d.game_name = String::new();

    assert_eq!(
        game_choices(&[a, b, c, d]),
        vec!["Apex Legends".to_string(), "Valorant".to_string()]
    );
}

#[test]
fn sort_key_parses_cli_names() {
    assert_eq!("views".parse::<SortKey>(), Ok(SortKey::Views));
    assert_eq!("Date".parse::<SortKey>(), Ok(SortKey::Date));
    assert_eq!(" duration ".parse::<SortKey>(), Ok(SortKey::Duration));
    assert!("length".parse::<SortKey>().is_err());
}

#[test]
fn display_helpers_match_gallery_format() {
    assert_eq!(format_views(999), "999");
    assert_eq!(format_views(1_500), "1.5K");
    assert_eq!(format_views(2_340_000), "2.3M");
    assert_eq!(format_duration(5), "0:05");
    assert_eq!(format_duration(75), "1:15");
}
