pub(crate) fn mul_div255_u32(x: u32, y: u32) -> u32 {
    (x * y + 127) / 255
}
