//! Held out HRS measurements with their soreness classes, used as the test split.

pub const TEST_INPUTS: [f32; 15] = [
    402.0, 455.0, 518.0, 577.0, 626.0, 671.0, 734.0, 802.0, 865.0, 921.0, 978.0, 1034.0, 1112.0,
    1187.0, 1254.0,
];

pub const TEST_LABELS: [f32; 15] = [
    0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0, 2.0,
];
