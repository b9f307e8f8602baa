use folio_core::GeometrySampler;
use folio_core::model::{Timeline, TimelineEntry};
use folio_core::views::minimap::scroll_ratio;
use folio_core::views::timeline::compute_snapshot;
use folio_core::views::{Track, VisibilityBand};
use folio_headless::HeadlessDom;
use folio_protocol::{Rect, ViewportMetrics};
use proptest::prelude::*;

fn metrics(height: f64, scroll_y: f64, scroll_height: f64) -> ViewportMetrics {
    ViewportMetrics {
        width: 1280.0,
        height,
        scroll_x: 0.0,
        scroll_y,
        scroll_height,
        scroll_width: 1280.0,
    }
}

fn one_entry() -> Timeline {
    Timeline::new(vec![TimelineEntry {
        years: "2020-2022".into(),
        title: "Engineer".into(),
        company: "Acme".into(),
        technologies: "Rust".into(),
        ..TimelineEntry::default()
    }])
}

#[test]
fn band_edges_are_inclusive() {
    let band = VisibilityBand::default();
    // Bottom edge exactly on the band's top line.
    assert!(band.contains(&Rect::new(0.0, -100.0, 10.0, 200.0), 1000.0));
    // Top edge exactly on the band's bottom line.
    assert!(band.contains(&Rect::new(0.0, 900.0, 10.0, 50.0), 1000.0));
    assert!(!band.contains(&Rect::new(0.0, 900.5, 10.0, 50.0), 1000.0));
}

proptest! {
    #[test]
    fn snapshot_holds_exactly_the_cards_in_the_band(
        top in -3000.0f64..3000.0,
        height in 1.0f64..2000.0,
        vh in 200.0f64..2000.0,
    ) {
        let dom = HeadlessDom::new();
        let card = dom.append_at(None, &[], Rect::new(0.0, top, 400.0, height));
        let sampler = GeometrySampler::new(&dom, metrics(vh, 0.0, 10_000.0));
        let band = VisibilityBand::default();
        let items = compute_snapshot(&dom, &sampler, &one_entry(), &[card], band);

        let expected = top <= vh * 0.9 && top + height >= vh * 0.1;
        prop_assert_eq!(band.contains(&Rect::new(0.0, top, 400.0, height), vh), expected);
        prop_assert_eq!(items.len(), usize::from(expected));
    }

    #[test]
    fn visible_percent_is_the_clamped_overlap(
        top in -3000.0f64..3000.0,
        height in 1.0f64..2000.0,
        vh in 200.0f64..2000.0,
    ) {
        let band = VisibilityBand::default();
        let percent = band.visible_percent(&Rect::new(0.0, top, 400.0, height), vh);
        let overlap = ((top + height).min(vh * 0.9) - top.max(vh * 0.1)).clamp(0.0, height);
        prop_assert!(percent <= 100);
        prop_assert_eq!(f64::from(percent), (100.0 * overlap / height).round());
    }

    #[test]
    fn indicator_never_drops_below_floor(
        vh in 100.0f64..3000.0,
        scroll_height in 0.0f64..1_000_000.0,
        track_height in 10.0f64..1000.0,
    ) {
        let track = Track::new(
            &metrics(vh, 0.0, scroll_height),
            &Rect::new(0.0, 0.0, 100.0, track_height),
            8.0,
        );
        prop_assert!(track.indicator >= 8.0);
        prop_assert!(track.draggable() >= 1.0);
    }

    #[test]
    fn scroll_ratio_stays_in_unit_range(
        vh in 100.0f64..3000.0,
        scroll_y in -5000.0f64..50_000.0,
        scroll_height in 0.0f64..40_000.0,
    ) {
        let ratio = scroll_ratio(&metrics(vh, scroll_y, scroll_height));
        prop_assert!((0.0..=1.0).contains(&ratio));
    }

    #[test]
    fn pointer_on_indicator_centre_maps_back_to_scroll(
        vh in 300.0f64..2000.0,
        extra in 1000.0f64..40_000.0,
        fraction in 0.0f64..=1.0,
        track_top in 0.0f64..500.0,
        track_height in 50.0f64..=400.0,
    ) {
        let scroll_height = vh + extra;
        let max_scroll = scroll_height - vh;
        let scroll_y = fraction * max_scroll;
        let m = metrics(vh, scroll_y, scroll_height);
        let track = Track::new(&m, &Rect::new(0.0, track_top, 100.0, track_height), 8.0);

        let centre = track.top + track.offset(scroll_ratio(&m)) + track.indicator / 2.0;
        let back = track.scroll_target(centre, m.max_scroll());
        prop_assert!((back - scroll_y).abs() <= 1.0, "{back} vs {scroll_y}");
    }
}
