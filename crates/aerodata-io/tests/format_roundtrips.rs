//! End-to-end conversion tests across the three scientific formats.

use aerodata_core::metadata::AttrValue;
use aerodata_core::Quantity;
use aerodata_io::{
    AeroNetCdf, Container, Ftype, NaDict, NaSaveOptions, NasaAmes, NetCdf, Hdf, Perms,
    ReadOptions,
};
use ndarray::{ArrayD, IxDyn};

fn array1(values: &[f64]) -> ArrayD<f64> {
    ArrayD::from_shape_vec(IxDyn(&[values.len()]), values.to_vec()).unwrap()
}

/// Build the reference NetCDF file: one `time` dimension of 5, one `data`
/// variable over it, and the four mapped global attributes.
fn build_reference_netcdf(path: &std::path::Path) {
    let mut nc = NetCdf::open(path, Perms::Write).unwrap();
    nc.add_attribute("institution", &AttrValue::from("EUFAR"), None)
        .unwrap();
    nc.add_attribute("authors", &AttrValue::from("John Doe"), None)
        .unwrap();
    nc.add_attribute("source", &AttrValue::from("computer"), None)
        .unwrap();
    nc.add_attribute("title", &AttrValue::from("a test file"), None)
        .unwrap();

    nc.add_dim("time", 5).unwrap();
    nc.write_variable(
        &array1(&[0.0, 1.0, 2.0, 3.0, 4.0]),
        "time",
        Some(&["time"]),
        Ftype::Double,
        None,
    )
    .unwrap();
    nc.add_attribute(
        "units",
        &AttrValue::from("days since 20170101 00:00:00Z"),
        Some("time"),
    )
    .unwrap();

    nc.write_variable(
        &array1(&[0.5, 2.3, 6.2, 8.1, 4.0]),
        "data",
        Some(&["time"]),
        Ftype::Double,
        Some(-999.0),
    )
    .unwrap();
    nc.add_attribute("units", &AttrValue::from("mm"), Some("data"))
        .unwrap();
    nc.add_attribute("long_name", &AttrValue::from("a common data"), Some("data"))
        .unwrap();
    nc.add_attribute("scale_factor", &AttrValue::Int(1), Some("data"))
        .unwrap();
    nc.close();
}

#[test]
fn test_netcdf_to_nasa_ames() {
    let dir = tempfile::tempdir().unwrap();
    let nc_path = dir.path().join("ref.nc");
    let na_path = dir.path().join("ref.na");
    build_reference_netcdf(&nc_path);

    let nc = NetCdf::open(&nc_path, Perms::Read).unwrap();
    nc.convert_to_nasa_ames(&na_path, &NaSaveOptions::default())
        .unwrap();

    let text = std::fs::read_to_string(&na_path).unwrap();
    let na = NaDict::parse(&text).unwrap();
    assert_eq!(na.oname, "John Doe");
    assert_eq!(na.sname, "computer");
    assert_eq!(na.org, "EUFAR");
    assert_eq!(na.mname, "a test file");
    assert_eq!(na.date, [2017, 1, 1]);
    assert_eq!(na.nv(), 1);
    assert_eq!(na.x, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    assert_eq!(na.v[0], vec![0.5, 2.3, 6.2, 8.1, 4.0]);
    assert_eq!(na.vmiss[0], Some(-999.0));

    // NLHEAD equals the number of header lines actually written.
    let first: usize = text
        .lines()
        .next()
        .unwrap()
        .split_whitespace()
        .next()
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(first, text.lines().count() - na.nx());
}

#[test]
fn test_nasa_ames_back_to_netcdf() {
    let dir = tempfile::tempdir().unwrap();
    let nc_path = dir.path().join("ref.nc");
    let na_path = dir.path().join("ref.na");
    let back_path = dir.path().join("back.nc");
    build_reference_netcdf(&nc_path);

    let nc = NetCdf::open(&nc_path, Perms::Read).unwrap();
    nc.convert_to_nasa_ames(&na_path, &NaSaveOptions::default())
        .unwrap();

    let na = NasaAmes::open(&na_path, Perms::Read).unwrap();
    na.convert_to_netcdf(&back_path).unwrap();

    let back = NetCdf::open(&back_path, Perms::Read).unwrap();
    let globals = back.get_attribute_list(None).unwrap();
    assert_eq!(globals.get_str("authors"), Some("John Doe"));
    assert_eq!(globals.get_str("institution"), Some("EUFAR"));
    assert_eq!(globals.get_str("source"), Some("computer"));
    assert_eq!(globals.get_str("title"), Some("a test file"));
    assert!(globals.get_str("history").unwrap().contains("converted to"));

    assert_eq!(
        back.get_dimension_list(None).unwrap(),
        vec![("time".to_string(), 5)]
    );
    let data = back.read_variable("data", &ReadOptions::all()).unwrap();
    assert_eq!(
        data.as_slice().unwrap(),
        &[0.5, 2.3, 6.2, 8.1, 4.0]
    );
    let attrs = back.get_attribute_list(Some("data")).unwrap();
    assert_eq!(attrs.get_str("units"), Some("mm"));
    assert_eq!(attrs.get_str("long_name"), Some("a common data"));
}

#[test]
fn test_netcdf_with_groups_refuses_nasa_ames() {
    let dir = tempfile::tempdir().unwrap();
    let nc_path = dir.path().join("grouped.nc");
    {
        let mut nc = NetCdf::open(&nc_path, Perms::Write).unwrap();
        nc.add_dim("time", 2).unwrap();
        nc.add_group("flight").unwrap();
        nc.close();
    }
    let nc = NetCdf::open(&nc_path, Perms::Read).unwrap();
    let result = nc.convert_to_nasa_ames(
        &dir.path().join("out.na"),
        &NaSaveOptions::default(),
    );
    assert!(matches!(result, Err(aerodata_io::FileError::Unsupported(_))));
}

#[test]
fn test_netcdf_multiple_root_dims_refuses_nasa_ames() {
    let dir = tempfile::tempdir().unwrap();
    let nc_path = dir.path().join("twodim.nc");
    {
        let mut nc = NetCdf::open(&nc_path, Perms::Write).unwrap();
        nc.add_dim("time", 2).unwrap();
        nc.add_dim("bins", 3).unwrap();
        nc.close();
    }
    let nc = NetCdf::open(&nc_path, Perms::Read).unwrap();
    let result = nc.convert_to_nasa_ames(
        &dir.path().join("out.na"),
        &NaSaveOptions::default(),
    );
    assert!(matches!(result, Err(aerodata_io::FileError::Unsupported(_))));
}

#[test]
fn test_hdf_group_roundtrip_through_netcdf() {
    let dir = tempfile::tempdir().unwrap();
    let h5_path = dir.path().join("grouped.h5");
    let nc_path = dir.path().join("grouped.nc");

    {
        let mut h5 = Hdf::open(&h5_path, Perms::Write).unwrap();
        h5.add_group("a/b").unwrap();
        h5.add_dim("a/b/t", &[0.0, 1.0, 2.0], Ftype::Double).unwrap();
        h5.write_variable(&array1(&[1.0, 2.0, 3.0]), "a/b/v", &["t"], Ftype::Double)
            .unwrap();
        h5.add_attribute("units", &AttrValue::from("m"), Some("a/b/v"))
            .unwrap();
        h5.close();
    }

    let h5 = Hdf::open(&h5_path, Perms::Read).unwrap();
    h5.convert_to_netcdf(&nc_path).unwrap();

    let nc = NetCdf::open(&nc_path, Perms::Read).unwrap();
    let groups = nc.get_group_list(Some("a"), false).unwrap();
    assert_eq!(groups, vec!["b"]);
    let data = nc.read_variable("a/b/v", &ReadOptions::all()).unwrap();
    assert_eq!(data.as_slice().unwrap(), &[1.0, 2.0, 3.0]);
    let attrs = nc.get_attribute_list(Some("a/b/v")).unwrap();
    assert_eq!(attrs.get_str("units"), Some("m"));
    assert_eq!(
        nc.get_dimension_list(Some("a/b/v")).unwrap(),
        vec![("t".to_string(), 3)]
    );
}

#[test]
fn test_hdf_dimension_scan_uses_labels() {
    let dir = tempfile::tempdir().unwrap();
    let h5_path = dir.path().join("labels.h5");
    {
        let mut h5 = Hdf::open(&h5_path, Perms::Write).unwrap();
        h5.add_dim("t", &[0.0, 1.0], Ftype::Double).unwrap();
        h5.write_variable(&array1(&[5.0, 6.0]), "speed", &["t"], Ftype::Double)
            .unwrap();
        h5.close();
    }
    let h5 = Hdf::open(&h5_path, Perms::Read).unwrap();
    assert_eq!(
        h5.get_dimension_list(None).unwrap(),
        vec![("t".to_string(), 2)]
    );
    assert_eq!(
        h5.get_dimension_list(Some("speed")).unwrap(),
        vec![("t".to_string(), 2)]
    );
}

#[test]
fn test_hdf_write_missing_scale_fails() {
    let dir = tempfile::tempdir().unwrap();
    let h5_path = dir.path().join("noscale.h5");
    let mut h5 = Hdf::open(&h5_path, Perms::Write).unwrap();
    let result = h5.write_variable(&array1(&[1.0]), "v", &["missing"], Ftype::Double);
    assert!(matches!(
        result,
        Err(aerodata_io::FileError::NotFound { kind: "dimension", .. })
    ));
}

#[test]
fn test_read_write_read_preserves_data() {
    let dir = tempfile::tempdir().unwrap();
    let nc_path = dir.path().join("ref.nc");
    let copy_path = dir.path().join("copy.nc");
    build_reference_netcdf(&nc_path);

    let source = NetCdf::open(&nc_path, Perms::Read).unwrap();
    let data = source.read_variable("data", &ReadOptions::all()).unwrap();

    let mut copy = NetCdf::open(&copy_path, Perms::Write).unwrap();
    copy.add_dim("time", 5).unwrap();
    copy.write_variable(&data, "data2", Some(&["time"]), Ftype::Double, None)
        .unwrap();
    copy.close();

    let reread = NetCdf::open(&copy_path, Perms::Read).unwrap();
    let copied = reread.read_variable("data2", &ReadOptions::all()).unwrap();
    assert_eq!(copied.as_slice().unwrap(), data.as_slice().unwrap());
}

#[test]
fn test_quantity_fill_nan_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let nc_path = dir.path().join("fill.nc");

    {
        let mut aware = AeroNetCdf::open(&nc_path, Perms::Write).unwrap();
        aware.inner_mut().add_dim("time", 4).unwrap();

        let mut q = Quantity::new(vec![1.0, f64::NAN, 3.0, f64::NAN], "m").unwrap();
        q.metadata.insert("name", "alt");
        q.metadata.insert("_FillValue", -999.0);
        aware
            .write_variable(&q, None, Some(&["time"]), Ftype::Double, None)
            .unwrap();
        aware.inner_mut().close();
    }

    let aware = AeroNetCdf::open(&nc_path, Perms::Read).unwrap();
    let q = aware
        .read_variable("alt", &ReadOptions::replacing_fill())
        .unwrap();
    assert_eq!(q.units(), "m");
    assert_eq!(q.value()[[0]], 1.0);
    assert!(q.value()[[1]].is_nan());
    assert_eq!(q.value()[[2]], 3.0);
    assert!(q.value()[[3]].is_nan());
}

#[test]
fn test_missing_value_stands_in_for_fill() {
    let dir = tempfile::tempdir().unwrap();
    let nc_path = dir.path().join("missing.nc");
    {
        let mut nc = NetCdf::open(&nc_path, Perms::Write).unwrap();
        nc.add_dim("time", 3).unwrap();
        nc.write_variable(
            &array1(&[1.0, -777.0, 2.0]),
            "v",
            Some(&["time"]),
            Ftype::Double,
            None,
        )
        .unwrap();
        nc.add_attribute("missing_value", &AttrValue::Float(-777.0), Some("v"))
            .unwrap();
        nc.close();
    }
    let nc = NetCdf::open(&nc_path, Perms::Read).unwrap();
    let data = nc.read_variable("v", &ReadOptions::replacing_fill()).unwrap();
    assert!(data[[1]].is_nan());
}

#[test]
fn test_netcdf_hdf_netcdf_preserves_structure() {
    let dir = tempfile::tempdir().unwrap();
    let nc_path = dir.path().join("ref.nc");
    let h5_path = dir.path().join("ref.h5");
    let back_path = dir.path().join("back.nc");
    build_reference_netcdf(&nc_path);

    let nc = NetCdf::open(&nc_path, Perms::Read).unwrap();
    nc.convert_to_hdf(&h5_path).unwrap();

    let h5 = Hdf::open(&h5_path, Perms::Read).unwrap();
    h5.convert_to_netcdf(&back_path).unwrap();

    let back = NetCdf::open(&back_path, Perms::Read).unwrap();
    let globals = back.get_attribute_list(None).unwrap();
    assert_eq!(globals.get_str("institution"), Some("EUFAR"));
    assert_eq!(globals.get_str("title"), Some("a test file"));

    let data = back.read_variable("data", &ReadOptions::all()).unwrap();
    assert_eq!(data.as_slice().unwrap(), &[0.5, 2.3, 6.2, 8.1, 4.0]);
    let attrs = back.get_attribute_list(Some("data")).unwrap();
    assert_eq!(attrs.get_str("units"), Some("mm"));
    assert_eq!(
        back.get_dimension_list(None).unwrap(),
        vec![("time".to_string(), 5)]
    );
}
