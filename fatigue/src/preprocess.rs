/// Divides every value by `scale_val`.
///
/// # Arguments
/// * `values` - The raw measurements.
/// * `scale_val` - The constant the measurements are scaled down by.
pub fn scale_column(values: &[f32], scale_val: f32) -> Vec<f32> {
    values.iter().map(|x| x / scale_val).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaling_divides_each_value() {
        let raw = [0.0, 512.0, 874.0, 1203.0];
        let scaled = scale_column(&raw, 1000.0);

        assert_eq!(scaled.len(), raw.len());
        for (x, s) in raw.iter().zip(&scaled) {
            assert_eq!(*s, x / 1000.0);
        }
    }

    #[test]
    fn scaling_is_deterministic() {
        let raw = [432.1, 999.9, 1500.0];
        assert_eq!(scale_column(&raw, 1000.0), scale_column(&raw, 1000.0));
    }

    #[test]
    fn empty_column() {
        assert!(scale_column(&[], 1000.0).is_empty());
    }
}
