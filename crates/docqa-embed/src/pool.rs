/// Scale `v` to unit length in place. Zero vectors are left unchanged.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm <= 1e-12 {
        return;
    }
    for x in v.iter_mut() {
        *x /= norm;
    }
}
