#[cfg(test)]
mod tests {
    use crate::image_pipeline::color::{
        AnalogBalance, BlackLevel, ChannelReduction, ColorMatrix, FloatBuffer, GammaCurve, PixelBuffer,
        PlanarBuffer, RawConverter, SRGB_FROM_XYZ_D65,
        matrix::apply_matrix,
        transform::normalized_cam_from_xyz,
    };
    use crate::image_pipeline::common::error::ConversionError;

    fn ramp_buffer() -> PixelBuffer {
        let v: Vec<u16> = (0..=u16::MAX).collect();
        PlanarBuffer::from_channels([v.clone(), v.clone(), v]).unwrap()
    }

    fn float_buffer(values: &[f32]) -> FloatBuffer {
        PlanarBuffer::from_channels([values.to_vec(), values.to_vec(), values.to_vec()]).unwrap()
    }

    fn sample_color_matrix() -> ColorMatrix {
        // ColorMatrix2 as found in an iPhone ProRaw DNG
        ColorMatrix::from_xyz_to_cam(&[
            [0.9303, -0.3554, -0.0644],
            [-0.4357, 1.2181, 0.2423],
            [-0.0509, 0.1383, 0.5937],
            [0.0, 0.0, 0.0],
        ])
    }

    #[test]
    fn test_gamma_endpoints() {
        let mut rc = RawConverter::new();
        let buffer = PixelBuffer::new(vec![0, u16::MAX, 0, u16::MAX, 0, u16::MAX], 2).unwrap();

        let out = rc.gamma_correction(&buffer);

        assert_eq!(out.channel(0), &[0, u16::MAX]);
        assert_eq!(out.channel(2), &[0, u16::MAX]);
    }

    #[test]
    fn test_gamma_linear_segment_below_threshold() {
        let mut rc = RawConverter::new();
        assert_eq!(rc.gamma_curve().threshold(), 205);

        let buffer = float_buffer(&[100.0, 204.0, 205.0]);
        let out = rc.gamma_correction(&buffer);

        assert_eq!(out.channel(1)[0], 1292);
        assert_eq!(out.channel(1)[1], 2635);
        // 205 is on the power segment
        let expected = ((205.0f64 / 65535.0).powf(1.0 / 2.4) * 1.055 - 0.055) * 65535.0;
        assert!((out.channel(1)[2] as f64 - expected).abs() <= 1.0);
    }

    #[test]
    fn test_gamma_cache_is_stable_across_calls() {
        let mut rc = RawConverter::new();
        let buffer = float_buffer(&[0.0, 1000.0, 30000.0, 65535.0]);

        let first = rc.gamma_correction(&buffer);
        let cached = rc.gamma_curve().cached_levels();
        let second = rc.gamma_correction(&buffer);

        assert_eq!(first, second);
        assert_eq!(cached, 4);
        assert_eq!(rc.gamma_curve().cached_levels(), 4);
        // same level in every channel maps to the same output
        assert_eq!(first.channel(0), first.channel(2));
        assert_eq!(rc.gamma_curve().cached(30000), Some(first.channel(0)[2]));
    }

    #[test]
    fn test_gamma_clamps_out_of_range_input() {
        let mut rc = RawConverter::new();
        let buffer = float_buffer(&[-12.0, 70000.0, f32::NAN]);

        let out = rc.gamma_correction(&buffer);

        assert_eq!(out.channel(0), &[0, u16::MAX, 0]);
    }

    #[test]
    fn test_max_value_change_recreates_curve() {
        let mut rc = RawConverter::new();
        let buffer = float_buffer(&[4095.0]);
        let full_range = rc.gamma_correction(&buffer);

        rc.set_max_value(4095).unwrap();
        assert_eq!(rc.gamma_curve().cached_levels(), 0);
        let twelve_bit = rc.gamma_correction(&buffer);

        assert_ne!(full_range, twelve_bit);
        assert_eq!(twelve_bit.channel(0)[0], 4095);

        rc.set_max_value(4095).unwrap();
        assert_eq!(rc.gamma_curve().cached_levels(), 1);
    }

    #[test]
    fn test_zero_max_value_is_rejected() {
        assert!(matches!(
            RawConverter::with_max_value(0),
            Err(ConversionError::InvalidMaxValue(0))
        ));
        let mut rc = RawConverter::new();
        assert!(rc.set_max_value(0).is_err());
        assert_eq!(rc.max_value(), u16::MAX);
    }

    #[test]
    fn test_gamma_invalidate_forgets_levels() {
        let mut curve = GammaCurve::default();
        let first = curve.encode(1000);
        curve.encode(30000);
        assert_eq!(curve.cached_levels(), 2);

        curve.invalidate();

        assert_eq!(curve.cached_levels(), 0);
        assert_eq!(curve.cached(1000), None);
        assert_eq!(curve.encode(1000), first);
    }

    #[test]
    fn test_gamma_set_max_value_clears_only_on_change() {
        let mut curve = GammaCurve::default();
        curve.encode(1000);

        curve.set_max_value(u16::MAX).unwrap();
        assert_eq!(curve.cached_levels(), 1);

        curve.set_max_value(4095).unwrap();
        assert_eq!(curve.max_value(), 4095);
        assert_eq!(curve.threshold(), 12);
        assert_eq!(curve.cached_levels(), 0);
        assert_eq!(curve.encode(4095), 4095);

        assert!(matches!(
            curve.set_max_value(0),
            Err(ConversionError::InvalidMaxValue(0))
        ));
        assert_eq!(curve.max_value(), 4095);
        assert_eq!(curve.cached_levels(), 1);
    }

    #[test]
    fn test_default_curve_matches_full_range_curve() {
        let mut default = GammaCurve::default();
        let mut full = GammaCurve::new(u16::MAX).unwrap();

        assert_eq!(default.max_value(), full.max_value());
        assert_eq!(default.threshold(), full.threshold());
        for level in [0, 100, 204, 205, 1000, 40000, u16::MAX] {
            assert_eq!(default.encode(level), full.encode(level));
        }
    }

    #[test]
    fn test_adjust_brightness_zero_rate_is_identity() {
        let mut rc = RawConverter::new();
        let data = ramp_buffer();

        let out = rc.adjust_brightness(&data, 0.0, false).unwrap();

        assert_eq!(out, data.map(|v| v as f32));
    }

    #[test]
    fn test_adjust_brightness_zero_rate_clips_input() {
        let mut rc = RawConverter::new();
        let data = float_buffer(&[-5.0, 10.0, 70000.0]);

        let out = rc.adjust_brightness(&data, 0.0, false).unwrap();

        assert_eq!(out.channel(2), &[0.0, 10.0, 65535.0]);
    }

    #[test]
    fn test_adjust_brightness_full_rate_is_constant() {
        let mut rc = RawConverter::new();
        let data = ramp_buffer();

        let out = rc.adjust_brightness(&data, 1.0, false).unwrap();

        assert!(out.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_adjust_brightness_near_full_rate_on_sparse_ramp() {
        let mut rc = RawConverter::new();
        let v: Vec<u16> = (0..=u16::MAX).step_by(10).collect();
        let data = PlanarBuffer::from_channels([v.clone(), v.clone(), v]).unwrap();

        let out = rc.adjust_brightness(&data, 0.999999, true).unwrap();

        let first = out.as_slice()[0];
        assert!(out.as_slice().iter().all(|&v| v == first));
        assert_eq!(rc.debug_log().get("min_value"), Some(0.0));
        assert_eq!(rc.debug_log().get("alpha"), Some(0.0));
    }

    #[test]
    fn test_adjust_brightness_window_on_ramp() {
        let mut rc = RawConverter::new();
        let data = ramp_buffer();
        // 20 bins (160 values) are cut off in total
        let rate = (8 * 10 * 2) as f32 / 65536.0;

        let out = rc.adjust_brightness(&data, rate, true).unwrap();

        let alpha = 65535.0f32 / (((1 << 13) - 10 - 1) * 8 - 80) as f32;
        let beta = -80.0 * alpha;
        let log = rc.debug_log();
        assert_eq!(log.get("acc_thresh"), Some(80.0));
        assert_eq!(log.get("min_value"), Some(80.0));
        assert_eq!(log.get("max_value"), Some(65448.0));
        assert_eq!(log.get("alpha"), Some(alpha as f64));
        assert_eq!(log.get("beta"), Some(beta as f64));

        for (i, &v) in out.channel(0).iter().enumerate() {
            let expected = (i as f32 * alpha + beta).clamp(0.0, 65535.0);
            assert!((v - expected).abs() < 0.05, "sample {}: {} vs {}", i, v, expected);
        }
        assert!(out.channel(1)[80].abs() < 0.01);
        assert_eq!(out.channel(1)[65535], 65535.0);
    }

    #[test]
    fn test_adjust_brightness_float_input() {
        let mut rc = RawConverter::new();
        let v = [
            -1.1, 8.0, 16.0, 32.0, 64.0, 128.0, 256.0, 512.0, 1024.0, 2048.0, 4096.0, 8192.0,
            16384.0, 32768.0, 65535.0, 65536.3,
        ];
        let data = float_buffer(&v);

        let out = rc.adjust_brightness(&data, 0.5, true).unwrap();

        let alpha = 65535.0f32 / (16376.0 - 40.0);
        let beta = -40.0 * alpha;
        assert_eq!(rc.debug_log().get("min_value"), Some(40.0));
        assert_eq!(rc.debug_log().get("max_value"), Some(16376.0));
        for (i, &x) in v.iter().enumerate() {
            let expected = (x.clamp(0.0, 65535.0) * alpha + beta).clamp(0.0, 65535.0);
            assert!((out.channel(2)[i] - expected).abs() < 0.05);
        }
    }

    #[test]
    fn test_adjust_brightness_is_monotonic() {
        let mut rc = RawConverter::new();
        let v: Vec<u16> = (0..4096u32).map(|i| (i * 13 % 65536) as u16).collect();
        let data = PlanarBuffer::from_channels([v.clone(), v.clone(), v.clone()]).unwrap();

        let out = rc.adjust_brightness(&data, 0.1, false).unwrap();

        for a in (0..v.len()).step_by(37) {
            for b in (0..v.len()).step_by(41) {
                if v[a] < v[b] {
                    assert!(out.channel(0)[a] <= out.channel(0)[b]);
                }
            }
        }
    }

    #[test]
    fn test_adjust_brightness_rejects_invalid_rate() {
        let mut rc = RawConverter::new();
        let data = ramp_buffer();
        for rate in [-0.1, 1.5, f32::NAN] {
            assert!(matches!(
                rc.adjust_brightness(&data, rate, false),
                Err(ConversionError::InvalidStretchRate(_))
            ));
        }
    }

    #[test]
    fn test_debug_log_only_filled_when_requested() {
        let mut rc = RawConverter::new();
        let data = ramp_buffer();

        rc.adjust_brightness(&data, 0.2, false).unwrap();
        assert!(rc.debug_log().is_empty());

        rc.adjust_brightness(&data, 0.2, true).unwrap();
        let log = rc.take_debug_log();
        let names: Vec<_> = log.entries().iter().map(|e| e.name).collect();
        assert_eq!(
            names,
            ["acc_thresh", "min_bin", "max_bin", "max_value", "min_value", "alpha", "beta"]
        );
        assert!(log.to_string().contains("alpha: "));
        assert!(rc.debug_log().is_empty());
    }

    #[test]
    fn test_black_level_scalar_takes_precedence() {
        let rc = RawConverter::new();
        let data = PixelBuffer::new(vec![1000; 6], 2).unwrap();
        let black = BlackLevel {
            scalar: 100,
            per_channel: [10, 20, 30, 40],
        };

        let out = rc.subtract_black(data, &black);

        assert!(out.as_slice().iter().all(|&v| v == 900));
    }

    #[test]
    fn test_black_level_per_channel() {
        let rc = RawConverter::new();
        let data = PixelBuffer::new(vec![1000, 5, 1000, 5, 1000, 5], 2).unwrap();
        let black = BlackLevel::per_channel(&[10, 0, 30]).unwrap();

        let out = rc.subtract_black(data, &black);

        assert_eq!(out.channel(0), &[990, 0]);
        assert_eq!(out.channel(1), &[1000, 5]);
        assert_eq!(out.channel(2), &[970, 0]);
    }

    #[test]
    fn test_normalize_bit_depth() {
        let rc = RawConverter::new();
        let data = PixelBuffer::new(vec![1, 8191, 9000, 0, 2, 3], 2).unwrap();

        let out = rc.normalize_bit_depth(data.clone(), 13);
        assert_eq!(out.as_slice(), &[8, 65528, 65535, 0, 16, 24]);

        let out = rc.normalize_bit_depth(data.clone(), 16);
        assert_eq!(out, data);
    }

    #[test]
    fn test_camera_to_xyz_round_trip() {
        let rc = RawConverter::new();
        let cm = sample_color_matrix();
        let ab = AnalogBalance::from_slice(&[1.1, 1.0, 0.9]).unwrap();
        let data = PixelBuffer::new(
            vec![0, 1200, 40000, 65535, 500, 20000, 30000, 100, 7000, 12000, 60000, 3],
            4,
        )
        .unwrap();

        let xyz = rc.camera_to_xyz(&data, &cm, &ab).unwrap();
        let back = apply_matrix(&xyz, &normalized_cam_from_xyz(&cm, &ab));

        for (orig, rec) in data.as_slice().iter().zip(back.as_slice()) {
            assert!((*orig as f32 - rec).abs() < 1.0, "{} vs {}", orig, rec);
        }
    }

    #[test]
    fn test_camera_to_xyz_white_maps_to_white_row_sums() {
        let rc = RawConverter::new();
        let cm = sample_color_matrix();
        let data = PixelBuffer::new(vec![1000, 1000, 1000], 1).unwrap();

        // normalized rows sum to 1, so camera neutral maps to the XYZ vector
        // whose image is neutral again
        let xyz = rc.camera_to_xyz(&data, &cm, &AnalogBalance::default()).unwrap();
        let back = apply_matrix(&xyz, &normalized_cam_from_xyz(&cm, &AnalogBalance::default()));
        assert!(back.as_slice().iter().all(|v| (v - 1000.0).abs() < 0.1));
    }

    #[test]
    fn test_camera_to_xyz_singular_matrix() {
        let rc = RawConverter::new();
        let data = ramp_buffer();
        let degenerate = ColorMatrix::from_xyz_to_cam(&[
            [0.5, 0.5, 0.0],
            [-1.0, 0.5, 0.5],
            [0.2, 0.3, 0.5],
            [0.0, 0.0, 0.0],
        ]);

        let result = rc.camera_to_xyz(&data, &degenerate, &AnalogBalance::default());

        assert!(matches!(result, Err(ConversionError::SingularColorMatrix { .. })));
    }

    #[test]
    fn test_xyz_to_srgb_uses_fixed_matrix() {
        let rc = RawConverter::new();
        let data = float_buffer(&[1.0]);
        let x_only = PlanarBuffer::from_channels([vec![1.0f32], vec![0.0], vec![0.0]]).unwrap();

        let out = rc.xyz_to_srgb(&x_only);
        assert_eq!(
            out.pixel(0),
            [SRGB_FROM_XYZ_D65[0][0], SRGB_FROM_XYZ_D65[1][0], SRGB_FROM_XYZ_D65[2][0]]
        );

        let out = rc.xyz_to_srgb(&data);
        let row_sum: f32 = SRGB_FROM_XYZ_D65[0].iter().sum();
        assert!((out.channel(0)[0] - row_sum).abs() < 1e-6);
    }

    #[test]
    fn test_camera_to_srgb_ignores_fourth_column() {
        let rc = RawConverter::new();
        let cm = ColorMatrix::from_cam_to_rgb(&[
            [1.5, -0.3, -0.2, 9.0],
            [-0.1, 1.2, -0.1, 9.0],
            [0.0, -0.4, 1.4, 9.0],
        ]);
        let data = PixelBuffer::new(vec![100, 200, 300], 1).unwrap();

        let out = rc.camera_to_srgb(&data, &cm);

        assert!((out.channel(0)[0] - (150.0 - 60.0 - 60.0)).abs() < 1e-3);
        assert!((out.channel(1)[0] - (-10.0 + 240.0 - 30.0)).abs() < 1e-3);
        assert!((out.channel(2)[0] - (-80.0 + 420.0)).abs() < 1e-3);
    }

    #[test]
    fn test_buffer_shape_is_checked() {
        assert!(matches!(
            PixelBuffer::new(vec![0; 7], 2),
            Err(ConversionError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            PlanarBuffer::from_channels([vec![0u16; 2], vec![0; 2], vec![0; 3]]),
            Err(ConversionError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            PixelBuffer::from_interleaved(&[0; 10], 2, ChannelReduction::DropFourth),
            Err(ConversionError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            PixelBuffer::from_interleaved(&[0; 10], 3, ChannelReduction::DropFourth),
            Err(ConversionError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_interleaved_layouts() {
        let rgbg = [10, 20, 30, 40, 11, 21, 31, 41];

        let dropped = PixelBuffer::from_interleaved(&rgbg, 4, ChannelReduction::DropFourth).unwrap();
        assert_eq!(dropped.channel(1), &[20, 21]);

        let averaged =
            PixelBuffer::from_interleaved(&rgbg, 4, ChannelReduction::AverageGreens).unwrap();
        assert_eq!(averaged.channel(0), &[10, 11]);
        assert_eq!(averaged.channel(1), &[30, 31]);
        assert_eq!(averaged.channel(2), &[30, 31]);

        assert_eq!(averaged.to_interleaved(), vec![10, 30, 30, 11, 31, 31]);
    }
}
