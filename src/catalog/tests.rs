//! Catalog integration tests

#[cfg(test)]
mod parser_tests {
    use crate::catalog::{TitleParser, normalize, parse_episode_number, parse_series_fragment};

    #[test]
    fn test_normalize_accents_and_case() {
        assert_eq!(normalize("  École   de CROISSANCE "), normalize("ecole de croissance"));
        let once = normalize("Le Jeûne — Série");
        assert_eq!(normalize(once.as_str()), once);
    }

    #[test]
    fn test_session_marker() {
        assert_eq!(parse_episode_number("Session 03 — La foi"), Some(3));
    }

    #[test]
    fn test_bible_reference_is_not_an_episode() {
        assert_eq!(parse_episode_number("Jean 3:16"), None);
        assert_eq!(parse_series_fragment("Jean 3:16"), None);
    }

    #[test]
    fn test_prefixed_fragment() {
        assert_eq!(
            parse_series_fragment("Série: Le jeûne | EP 4").as_deref(),
            Some("Le jeûne")
        );
        let parsed = TitleParser::parse("Série: Le jeûne | EP 4");
        assert_eq!(parsed.episode, Some(4));
        assert!(parsed.has_series_signal());
    }

    #[test]
    fn test_entities_are_decoded_first() {
        assert_eq!(
            parse_series_fragment("L&#8217;amour de Dieu &#8211; EP 2").as_deref(),
            Some("L\u{2019}amour de Dieu")
        );
    }
}

#[cfg(test)]
mod aggregator_tests {
    use crate::catalog::{RawContentItem, SeriesAggregator, SeriesKeyBuilder};
    use chrono::{TimeZone, Utc};

    fn item(id: &str, title: &str, day: u32) -> RawContentItem {
        RawContentItem::new(
            id,
            title,
            Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            "wordpress",
        )
    }

    #[test]
    fn test_representative_independent_of_order() {
        let items = vec![
            item("wp:3", "La foi EP 3", 3),
            item("wp:1", "La foi EP 1", 9),
            item("wp:2", "La foi EP 2", 1),
        ];
        let aggregator = SeriesAggregator::default();

        let forward = aggregator.aggregate(&items);
        let mut reversed_items = items.clone();
        reversed_items.reverse();
        let reversed = aggregator.aggregate(&reversed_items);

        assert_eq!(forward.len(), 1);
        assert_eq!(forward[0].representative.id, "wp:1");
        assert_eq!(reversed[0].representative.id, "wp:1");
        let order: Vec<_> = forward[0].items().map(|i| i.id.as_str()).collect();
        assert_eq!(order, vec!["wp:1", "wp:2", "wp:3"]);
    }

    #[test]
    fn test_date_tiebreak_equal_numbers() {
        let items = vec![
            item("wp:b", "La prière | Partie deux", 5),
            item("wp:a", "La prière | Partie un", 2),
        ];
        let keys = SeriesKeyBuilder::default();
        let aggregator = SeriesAggregator::new(keys);

        // no numeric marker: no series signal at all
        assert!(aggregator.aggregate(&items).is_empty());

        let items = vec![item("wp:b", "La prière EP 2", 5), item("wp:a", "La prière #2", 2)];
        let groups = aggregator.aggregate(&items);
        assert_eq!(groups[0].representative.id, "wp:a");
    }

    #[test]
    fn test_date_tiebreak_without_numbers() {
        // "EP 0" keeps the fragment but carries no episode number
        let items = vec![
            item("wp:late", "La foi EP 0", 2),
            item("wp:early", "La foi EP 0", 1),
        ];
        let aggregator = SeriesAggregator::default();

        let groups = aggregator.aggregate(&items);
        assert_eq!(groups.len(), 1);
        assert!(groups[0].episodes.iter().all(|ep| ep.episode_number.is_none()));
        assert_eq!(groups[0].representative.id, "wp:early");

        let mut reversed = items.clone();
        reversed.reverse();
        assert_eq!(aggregator.aggregate(&reversed)[0].representative.id, "wp:early");
    }

    #[test]
    fn test_aliases_merge_groups() {
        let items = vec![
            item("wp:1", "Ecole croissance EP 1", 1),
            item("wp:2", "École de croissance EP 2", 2),
        ];
        let groups = SeriesAggregator::default().aggregate(&items);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].canonical_name, "École de croissance");
        assert_eq!(groups[0].episode_count(), 2);
    }
}

#[cfg(test)]
mod sibling_tests {
    use crate::catalog::testing::{CmsCall, MockCms};
    use crate::catalog::{
        CatalogError, RawContentItem, SeriesKeyBuilder, SiblingConfig, SiblingResolver,
        StrategyKind, Term, TermQuery,
    };
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn item(id: &str, title: &str, day: u32) -> RawContentItem {
        RawContentItem::new(
            id,
            title,
            Utc.with_ymd_and_hms(2024, 2, day, 0, 0, 0).unwrap(),
            "wordpress",
        )
        .with_slug(crate::catalog::slugify(title))
    }

    fn resolver(cms: Arc<MockCms>) -> SiblingResolver {
        SiblingResolver::new(cms, SeriesKeyBuilder::default(), SiblingConfig::default())
    }

    #[tokio::test]
    async fn test_series_tag_short_circuits() {
        let tag = Term::new(5, "Série: La foi", "serie-la-foi");
        let focal = item("wp:2", "La foi EP 2", 2).with_tag(tag.clone());
        let cms = Arc::new(MockCms::new().with_tags(vec![tag.clone()]).with_posts(vec![
            item("wp:1", "La foi EP 1", 1).with_tag(tag.clone()),
            focal.clone(),
            item("wp:3", "La foi EP 3", 3).with_tag(tag),
        ]));

        let siblings = resolver(cms.clone()).resolve(&focal).await.unwrap();

        assert_eq!(siblings.matched_by, Some(StrategyKind::ExactSeriesTag));
        let ids: Vec<_> = siblings.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["wp:1", "wp:2", "wp:3"]);
        assert_eq!(cms.post_calls(), 1);
        assert!(!cms.calls().iter().any(|c| matches!(c, CmsCall::Tags(_))));
    }

    #[tokio::test]
    async fn test_scored_tag_filters_on_signal() {
        let audio = Term::new(3, "Audio", "audio");
        let foi = Term::new(8, "La foi", "la-foi");
        let focal = item("wp:2", "La foi EP 2", 2)
            .with_tag(audio.clone())
            .with_tag(foi.clone());
        let cms = Arc::new(MockCms::new().with_posts(vec![
            item("wp:1", "La foi EP 1", 1).with_tag(foi.clone()),
            item("wp:9", "Autre chose", 4).with_tag(foi.clone()).with_tag(audio),
            item("wp:3", "La foi EP 3", 3).with_tag(foi),
            focal.clone(),
        ]));

        let siblings = resolver(cms).resolve(&focal).await.unwrap();

        assert_eq!(siblings.matched_by, Some(StrategyKind::ScoredTag));
        let ids: Vec<_> = siblings.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["wp:1", "wp:2", "wp:3"]);
    }

    #[tokio::test]
    async fn test_fragment_tag_lookup() {
        let reveil = Term::new(20, "Le réveil", "le-reveil");
        let focal = item("wp:2", "Le réveil EP 2", 2);
        let cms = Arc::new(MockCms::new().with_tags(vec![reveil.clone()]).with_posts(vec![
            item("wp:1", "Le réveil EP 1", 1).with_tag(reveil),
            item("wp:3", "Le réveil EP 3", 3),
            focal.clone(),
        ]));

        let siblings = resolver(cms).resolve(&focal).await.unwrap();

        assert_eq!(siblings.matched_by, Some(StrategyKind::FragmentTagSearch));
        let ids: Vec<_> = siblings.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["wp:1", "wp:2"]);
    }

    #[tokio::test]
    async fn test_fragment_tag_lookup_by_series_slug() {
        let edc = Term::new(30, "EDC", "serie-ecole-de-croissance");
        let focal = item("wp:2", "Ecole croissance EP 2", 2);
        let cms = Arc::new(MockCms::new().with_tags(vec![edc.clone()]).with_posts(vec![
            item("wp:1", "École de croissance EP 1", 1).with_tag(edc),
            focal.clone(),
        ]));

        let siblings = resolver(cms.clone()).resolve(&focal).await.unwrap();

        assert_eq!(siblings.matched_by, Some(StrategyKind::FragmentTagSearch));
        assert_eq!(siblings.items.len(), 2);
        let tag_queries: Vec<_> = cms
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                CmsCall::Tags(TermQuery::Search(q)) => Some(q),
                _ => None,
            })
            .collect();
        assert_eq!(tag_queries, vec!["Ecole croissance", "ecole-de-croissance"]);
    }

    #[tokio::test]
    async fn test_scored_category_filters_on_signal() {
        let vivante = Term::new(40, "La foi vivante", "la-foi-vivante");
        let focal = item("wp:2", "La foi vivante EP 2", 2).with_category(vivante.clone());
        let cms = Arc::new(MockCms::new().with_posts(vec![
            item("wp:1", "La foi vivante EP 1", 1).with_category(vivante.clone()),
            item("wp:9", "Annonces", 4).with_category(vivante),
            item("wp:3", "La foi vivante EP 3", 3),
            focal.clone(),
        ]));

        let siblings = resolver(cms).resolve(&focal).await.unwrap();

        assert_eq!(siblings.matched_by, Some(StrategyKind::ScoredCategory));
        let ids: Vec<_> = siblings.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["wp:1", "wp:2"]);
    }

    #[tokio::test]
    async fn test_token_search_requires_both_tokens() {
        let focal = item("wp:2", "Marcher par l'Esprit EP 2", 2);
        let cms = Arc::new(MockCms::new().with_posts(vec![
            item("wp:1", "Marcher selon l'Esprit EP 1", 1),
            item("wp:7", "Marcher dans l'amour EP 1", 3),
            item("wp:8", "Le fruit de l'Esprit", 4),
            focal.clone(),
        ]));

        let siblings = resolver(cms).resolve(&focal).await.unwrap();

        assert_eq!(siblings.matched_by, Some(StrategyKind::TokenSearch));
        let ids: Vec<_> = siblings.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["wp:1", "wp:2"]);
    }

    #[tokio::test]
    async fn test_token_search_single_token() {
        let focal = item("wp:2", "Sanctification EP 2", 2);
        let cms = Arc::new(MockCms::new().with_posts(vec![
            item("wp:1", "La sanctification du croyant EP 1", 1),
            item("wp:5", "Louange", 5),
            focal.clone(),
        ]));

        let siblings = resolver(cms).resolve(&focal).await.unwrap();

        assert_eq!(siblings.matched_by, Some(StrategyKind::TokenSearch));
        let ids: Vec<_> = siblings.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["wp:1", "wp:2"]);
    }

    #[tokio::test]
    async fn test_errors_before_final_are_swallowed() {
        let focal = item("wp:2", "La foi EP 2", 2);
        let cms = Arc::new(
            MockCms::new()
                .with_posts(vec![item("wp:1", "La foi EP 1", 1), focal.clone()])
                .failing_when(|call| matches!(call, CmsCall::Tags(_))),
        );

        let siblings = resolver(cms.clone()).resolve(&focal).await.unwrap();

        assert_eq!(siblings.matched_by, Some(StrategyKind::FragmentSearch));
        assert_eq!(siblings.items.len(), 2);
        assert!(cms.calls().iter().any(|c| matches!(c, CmsCall::Tags(_))));
    }

    #[tokio::test]
    async fn test_global_fallback_never_empty() {
        let focal = item("wp:5", "Culte du dimanche", 5);
        let cms = Arc::new(MockCms::new().with_posts(vec![
            item("wp:1", "Louange", 1),
            item("wp:2", "Annonces", 2),
            focal.clone(),
        ]));

        let siblings = resolver(cms).resolve(&focal).await.unwrap();

        assert_eq!(siblings.matched_by, Some(StrategyKind::RecentFallback));
        assert!(siblings.items.iter().any(|i| i.id == "wp:5"));
        assert_eq!(siblings.items.len(), 3);
    }

    #[tokio::test]
    async fn test_final_strategy_error_propagates() {
        let focal = item("wp:5", "Culte du dimanche", 5);
        let cms = Arc::new(MockCms::new().failing());

        let err = resolver(cms).resolve(&focal).await.unwrap_err();
        assert!(matches!(err, CatalogError::ProviderUnavailable(_)));
    }

    #[tokio::test]
    async fn test_no_match_returns_focal_only() {
        let focal = item("wp:5", "Le réveil EP 1", 5);
        let cms = Arc::new(MockCms::new().with_posts(vec![item("wp:1", "Louange", 1)]));

        let siblings = resolver(cms).resolve(&focal).await.unwrap();

        assert_eq!(siblings.matched_by, None);
        assert_eq!(siblings.items, vec![focal]);
    }

    #[tokio::test]
    async fn test_same_category_without_signal() {
        let cultes = Term::new(12, "Cultes", "cultes");
        let focal = item("wp:5", "Culte du dimanche", 5).with_category(cultes.clone());
        let cms = Arc::new(MockCms::new().with_posts(vec![
            item("wp:1", "Culte de Pâques", 1).with_category(cultes),
            item("wp:2", "Annonces", 2),
            focal.clone(),
        ]));

        let siblings = resolver(cms).resolve(&focal).await.unwrap();

        assert_eq!(siblings.matched_by, Some(StrategyKind::SameCategory));
        let ids: Vec<_> = siblings.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["wp:1", "wp:5"]);
    }
}

#[cfg(test)]
mod dedup_tests {
    use crate::catalog::{RailDeduplicator, RawContentItem, Section, dedup};
    use chrono::Utc;

    #[test]
    fn test_first_occurrence_wins() {
        let rails = vec![vec!["a", "b"], vec!["b", "c"], vec!["c", "d"]];
        assert_eq!(dedup(rails), vec![vec!["a", "b"], vec!["c"], vec!["d"]]);
    }

    #[test]
    fn test_repeats_inside_one_rail() {
        assert_eq!(dedup(vec![vec!["a", "a", "b"]]), vec![vec!["a", "b"]]);
    }

    #[test]
    fn test_emptied_sections_dropped() {
        let item = |id: &str| RawContentItem::new(id, id, Utc::now(), "wordpress");
        let sections = vec![
            Section::new("one", "One", vec![item("a"), item("b")]),
            Section::new("two", "Two", vec![item("b")]),
            Section::new("three", "Three", vec![item("c")]),
        ];

        let kept = RailDeduplicator::dedup_sections(sections);
        let keys: Vec<_> = kept.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["one", "three"]);
    }
}

#[cfg(test)]
mod service_tests {
    use crate::catalog::testing::{MockCms, MockVideo};
    use crate::catalog::{
        CatalogError, CatalogService, GroupSource, HomeConfig, Playlist, RawContentItem,
        SeriesCatalogConfig, SeriesKeyBuilder,
    };
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::Arc;

    fn item(id: &str, title: &str, day: u32) -> RawContentItem {
        RawContentItem::new(
            id,
            title,
            Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap(),
            "wordpress",
        )
    }

    fn playlist() -> Playlist {
        let video = |vid: &str, title: &str, day: u32| {
            RawContentItem::new(
                format!("ytpl:PL1:{vid}"),
                title,
                Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap(),
                "youtube",
            )
        };
        Playlist {
            id: "PL1".to_string(),
            title: "Le jeûne".to_string(),
            items: vec![video("b", "Le jeûne 2", 4), video("a", "Le jeûne 1", 2)],
        }
    }

    #[tokio::test]
    async fn test_series_catalog_walks_all_pages() {
        let cms = Arc::new(MockCms::new().with_posts(vec![
            item("wp:1", "La foi EP 1", 1),
            item("wp:2", "La foi EP 2", 2),
            item("wp:3", "Le jeûne EP 1", 3),
            item("wp:4", "Annonces", 4),
            item("wp:5", "La prière #1", 5),
        ]));
        let video = Arc::new(MockVideo::new().with_playlist(playlist()));
        let service = CatalogService::new(cms.clone(), SeriesKeyBuilder::default())
            .with_video(video, None)
            .with_series_config(SeriesCatalogConfig {
                per_page: 2,
                fetch_concurrency: 1,
                playlists: vec!["https://www.youtube.com/playlist?list=PL1".to_string()],
                ..SeriesCatalogConfig::default()
            });

        let catalog = service.get_series_catalog().await.unwrap();

        assert_eq!(catalog.total_posts, 5);
        assert_eq!(cms.post_calls(), 3);
        let names: Vec<_> = catalog.series.iter().map(|s| s.canonical_name.as_str()).collect();
        assert_eq!(names, vec!["Le jeûne", "La foi", "La prière"]);
        assert_eq!(
            catalog.series[0].source,
            GroupSource::Playlist { id: "PL1".to_string() }
        );
        assert_eq!(catalog.series[1].episode_count(), 2);
    }

    #[tokio::test]
    async fn test_series_catalog_first_page_failure() {
        let service = CatalogService::new(Arc::new(MockCms::new().failing()), SeriesKeyBuilder::default());
        assert!(service.get_series_catalog().await.is_err());
    }

    #[tokio::test]
    async fn test_playlist_siblings() {
        let cms = Arc::new(MockCms::new());
        let video = Arc::new(MockVideo::new().with_playlist(playlist()));
        let service = CatalogService::new(cms.clone(), SeriesKeyBuilder::default()).with_video(video, None);

        let items = service.get_siblings("ytpl:PL1:b").await.unwrap();
        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["ytpl:PL1:a", "ytpl:PL1:b"]);
        assert!(cms.calls().is_empty());

        let missing = service.get_siblings("ytpl:PL1:zzz").await.unwrap_err();
        assert!(matches!(missing, CatalogError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_post_siblings_by_ref() {
        let cms = Arc::new(MockCms::new().with_posts(vec![
            item("wp:1", "La foi EP 1", 1),
            item("wp:2", "La foi EP 2", 2),
        ]));
        let service = CatalogService::new(cms, SeriesKeyBuilder::default());

        let siblings = service.resolve_siblings("wp:2").await.unwrap();
        assert_eq!(siblings.items.len(), 2);

        let unknown = service.resolve_siblings("nope").await.unwrap_err();
        assert!(matches!(unknown, CatalogError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_home_catalog_dedups_across_rails() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        let fresh = RawContentItem::new("yt:new", "Live", now - Duration::days(1), "youtube");
        let cms = Arc::new(MockCms::new().with_posts(vec![item("wp:1", "La foi EP 1", 8)]));
        let video = Arc::new(MockVideo::new().with_channel_videos(vec![fresh]));
        let service = CatalogService::new(cms, SeriesKeyBuilder::default())
            .with_video(video, Some("UC1".to_string()))
            .with_home_config(HomeConfig {
                category_rails: Vec::new(),
                featured_series: None,
                themes: Vec::new(),
                ..HomeConfig::default()
            });

        let sections = service.get_home_catalog_at(now).await.unwrap();

        let keys: Vec<_> = sections.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["new-week"]);
        let ids: Vec<_> = sections[0].items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["yt:new", "wp:1"]);
    }
}
