//! Volume integration tests.
//!
//! Tests verify:
//! - Series assembly from unordered single-frame files
//! - Axial access through the decode cache, with shared in-flight decodes
//! - Sagittal and coronal reslicing of decoded data
//! - Thick-slab averaging over a decoded base volume

use std::sync::Arc;

use dicom_mpr::{
    parse, DecodeScheduler, Direction, FrameSource, MultiPlanarVolume, PixelData, PixelDecoder,
    Plane, Priority, Series, VolumeError,
};

use super::test_utils::volume_slice;

/// Assemble a volume from `(instance, z, samples)` slices.
fn volume(slices: &[(i64, f64, [u16; 4])]) -> MultiPlanarVolume<FrameSource> {
    let datasets = slices
        .iter()
        .map(|&(instance, z, values)| parse(volume_slice(instance, z, values)).unwrap())
        .collect();
    let series = Series::assemble(datasets).unwrap();
    series
        .into_volume(PixelDecoder::default(), DecodeScheduler::new(2).unwrap())
        .unwrap()
}

/// Three 2x2 slices where pixel (x, y) of slice k holds 10k + 2y + x,
/// supplied out of order.
fn small_volume() -> MultiPlanarVolume<FrameSource> {
    volume(&[
        (3, 5.0, [20, 21, 22, 23]),
        (1, 0.0, [0, 1, 2, 3]),
        (2, 2.5, [10, 11, 12, 13]),
    ])
}

fn u16_samples(data: &PixelData) -> Vec<u16> {
    match data {
        PixelData::U16(v) => v.clone(),
        other => panic!("expected 16-bit samples, got {:?}", other.sample_type()),
    }
}

// =============================================================================
// Series
// =============================================================================

#[tokio::test]
async fn test_series_geometry() {
    let volume = small_volume();
    let geometry = volume.geometry();

    assert_eq!(geometry.size(), [2, 2, 3]);
    assert_eq!(geometry.spacing(), [0.5, 0.5, 2.5]);
    // LPS (-10, -10, 0) in RAS
    assert_eq!(geometry.origin(), [10.0, 10.0, 0.0]);

    let physical = geometry.index_to_physical([1.0, 1.0, 2.0]);
    assert_eq!(physical, [9.5, 9.5, 5.0]);
    assert_eq!(geometry.physical_to_index(physical), [1.0, 1.0, 2.0]);
    assert!(geometry.is_inside([1.0, 1.0, 2.0]));
    assert!(!geometry.is_inside([2.0, 0.0, 0.0]));
}

#[tokio::test]
async fn test_series_skips_datasets_without_pixels() {
    let mut empty = parse(volume_slice(9, 9.0, [0; 4])).unwrap();
    empty.clear_pixel_data();
    let with_pixels = parse(volume_slice(1, 0.0, [1, 2, 3, 4])).unwrap();

    let series = Series::assemble(vec![empty, with_pixels]).unwrap();
    assert_eq!(series.len(), 1);

    let mut only_empty = parse(volume_slice(9, 9.0, [0; 4])).unwrap();
    only_empty.clear_pixel_data();
    assert_eq!(
        Series::assemble(vec![only_empty]).unwrap_err(),
        VolumeError::EmptySeries
    );
}

// =============================================================================
// Axial
// =============================================================================

#[tokio::test]
async fn test_axial_follows_position_order() {
    let volume = small_volume();

    for k in 0..3u16 {
        let slice = volume.get_axial(k as usize).await.unwrap();
        assert_eq!(slice.plane, Plane::Axial);
        assert_eq!(slice.size, [2, 2]);
        assert_eq!(slice.spacing, [0.5, 0.5]);
        assert_eq!(
            u16_samples(&slice.image.pixels),
            vec![10 * k, 10 * k + 1, 10 * k + 2, 10 * k + 3]
        );
    }
    assert!(volume.cache().is_ready());
}

#[tokio::test]
async fn test_concurrent_requests_share_one_decode() {
    let volume = small_volume();
    let cache = volume.cache();

    let (a, b) = tokio::join!(
        cache.get_async(1, Priority::High),
        cache.get_async(1, Priority::Low)
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&a, &cache.get_sync(1).unwrap()));
    assert_eq!(cache.progress(), (1, 3));
}

#[tokio::test]
async fn test_sync_access_before_decode() {
    let volume = small_volume();
    assert_eq!(volume.cache().get_sync(0).unwrap_err(), VolumeError::NotReady(0));
    assert!(matches!(
        volume.get_axial(3).await,
        Err(VolumeError::LayerOutOfBounds { index: 3, count: 3 })
    ));
}

// =============================================================================
// Reslicing
// =============================================================================

#[tokio::test]
async fn test_sagittal_slice() {
    let volume = small_volume();
    let view = volume.sagittal();
    assert_eq!(view.size, [2, 3]);
    assert_eq!(view.count, 2);
    assert_eq!(view.labels, [
        Direction::Superior,
        Direction::Posterior,
        Direction::Inferior,
        Direction::Anterior,
    ]);

    // Column x = 1; rows run superior (last slice) to inferior
    let slice = volume.get_sagittal(1).await.unwrap();
    assert_eq!(slice.spacing, [0.5, 2.5]);
    assert_eq!(
        u16_samples(&slice.image.pixels),
        vec![21, 23, 11, 13, 1, 3]
    );
}

#[tokio::test]
async fn test_coronal_slice() {
    let volume = small_volume();
    let slice = volume.get_coronal(0).await.unwrap();
    assert_eq!(slice.size, [2, 3]);
    assert_eq!(volume.coronal().label_string(), "S L I R");
    // Row y = 0
    assert_eq!(
        u16_samples(&slice.image.pixels),
        vec![20, 21, 10, 11, 0, 1]
    );
    assert!(matches!(
        volume.get_coronal(2).await,
        Err(VolumeError::LayerOutOfBounds { index: 2, count: 2 })
    ));
}

#[tokio::test]
async fn test_plane_round_trip() {
    let volume = small_volume();
    let geometry = volume.geometry();

    for plane in Plane::ALL {
        let view = geometry.plane(plane);
        for slice in 0..view.count {
            for y in 0..view.size[1] {
                for x in 0..view.size[0] {
                    let xy = [x as f64, y as f64];
                    let index = view.to_index3(xy, slice as f64);
                    assert!(geometry.is_inside(index));
                    assert_eq!(view.from_index3(index), (xy, slice as f64));

                    let physical = geometry.plane_to_physical(plane, xy, slice as f64);
                    assert_eq!(geometry.physical_to_plane(plane, physical), (xy, slice as f64));
                }
            }
        }
    }
}

// =============================================================================
// Thick Slabs
// =============================================================================

/// 32 slices; every pixel of slice i holds i * i.
fn squares_volume() -> MultiPlanarVolume<FrameSource> {
    let slices: Vec<(i64, f64, [u16; 4])> = (0..32)
        .map(|i| (i + 1, i as f64 * 2.0, [(i * i) as u16; 4]))
        .collect();
    volume(&slices)
}

#[tokio::test]
async fn test_thick_layer_reads_its_base_range() {
    let volume = squares_volume();
    let thick = volume.thick(4).unwrap();

    assert_eq!(thick.geometry().size(), [2, 2, 8]);
    assert_eq!(thick.geometry().spacing(), [0.5, 0.5, 8.0]);
    assert_eq!(thick.geometry().origin(), volume.geometry().origin());

    // (400 + 441 + 484 + 529) / 4 = 463.5
    let slab = thick.get_axial(5).await.unwrap();
    assert_eq!(u16_samples(&slab.image.pixels), vec![463; 4]);

    // Exactly base layers 20..24 were decoded
    assert_eq!(volume.cache().progress(), (4, 32));
    for k in 0..32 {
        assert_eq!(volume.cache().try_get(k).is_some(), (20..24).contains(&k));
    }
}

#[tokio::test]
async fn test_thick_metadata_comes_from_first_base_layer() {
    let volume = squares_volume();
    let thick = volume.thick(4).unwrap();

    let uid = thick.cache().metadata(5).and_then(|ds| ds.sop_instance_uid());
    assert_eq!(uid, Some("1.2.3.21"));
    assert!(thick.cache().metadata(8).is_none());
}

#[tokio::test]
async fn test_thick_multiplier_must_exceed_one() {
    let volume = small_volume();
    assert!(matches!(volume.thick(1), Err(VolumeError::InvalidMultiplier(1))));
    assert!(matches!(volume.thick(0), Err(VolumeError::InvalidMultiplier(0))));
}

#[tokio::test]
async fn test_thick_sagittal_forces_whole_slab_stack() {
    let volume = squares_volume();
    let thick = volume.thick(8).unwrap();

    let slice = thick.get_sagittal(0).await.unwrap();
    assert_eq!(slice.size, [2, 4]);
    // Slab s averages (8s)^2..(8s+7)^2; top row is the last slab
    let slab = |s: u32| ((8 * s..8 * s + 8).map(|i| i * i).sum::<u32>() / 8) as u16;
    assert_eq!(
        u16_samples(&slice.image.pixels),
        vec![slab(3), slab(3), slab(2), slab(2), slab(1), slab(1), slab(0), slab(0)]
    );
    assert!(thick.cache().is_ready());
    assert!(volume.cache().is_ready());
}
