#![cfg(feature = "host")]
#![allow(missing_docs)]
//! Gap files are flat JSON arrays of integers.

use matrix_envoy::Error;
use matrix_envoy::led2d::{Gap, GapMask, MatrixMap, Panel, UNMAPPED};

#[test]
fn gap_file_parses_and_clamps() {
    let mask = GapMask::<8>::from_json("[1, -1, 0, 5, -3]").expect("valid gap file");
    assert_eq!(
        mask.as_slice(),
        &[
            Gap::Active,
            Gap::Missing,
            Gap::Inactive,
            Gap::Active,
            Gap::Missing
        ]
    );
}

#[test]
fn gap_file_must_be_an_integer_array() {
    assert_eq!(
        GapMask::<8>::from_json("[1, \"a\"]"),
        Err(Error::GapMaskFormat)
    );
    assert_eq!(GapMask::<8>::from_json("{\"gaps\": [1]}"), Err(Error::GapMaskFormat));
    assert_eq!(GapMask::<8>::from_json("[1.5]"), Err(Error::GapMaskFormat));
    assert_eq!(GapMask::<8>::from_json(""), Err(Error::GapMaskFormat));
}

#[test]
fn gap_file_drives_mapping() {
    let mask = GapMask::<9>::from_json("[1,1,1, 1,-1,1, 1,1,1]").expect("valid gap file");
    let map: MatrixMap<9> = MatrixMap::build(&[Panel::new(3, 3)], Some(&mask), 9);

    assert_eq!(map.raw(), &[0, 1, 2, 3, UNMAPPED, 4, 5, 6, 7]);
}
