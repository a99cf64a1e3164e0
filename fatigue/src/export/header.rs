/// Renders `bytes` as a C header declaring `<var_name>_len` and the `<var_name>` byte array.
///
/// The array lists 12 bytes per line, each formatted as `0x%02x`, inside `<VAR_NAME>_H` include
/// guards.
pub fn hex_to_c_array(bytes: &[u8], var_name: &str) -> String {
    let guard = format!("{}_H", var_name.to_uppercase());
    let mut out = String::with_capacity(bytes.len() * 6 + 128);

    out.push_str(&format!("#ifndef {guard}\n#define {guard}\n\n"));
    out.push_str(&format!("\nunsigned int {var_name}_len = {};\n", bytes.len()));
    out.push_str(&format!("unsigned char {var_name}[] = {{\n "));

    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{byte:#04x}"));

        if i + 1 < bytes.len() {
            out.push(',');
        }

        if (i + 1) % 12 == 0 {
            out.push_str("\n ");
        }
    }

    out.push_str(&format!("\n}};\n\n#endif //{guard}"));
    out
}
