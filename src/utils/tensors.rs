use burn::tensor::{backend::Backend, Data, ElementConversion, Int, Shape, Tensor};

/// Stack token rows into a `[batch_size, seq_length]` tensor, truncating long rows and filling
/// short ones with `pad_value`
pub fn pad_to<B: Backend>(
    pad_value: u32,
    rows: &[&[u32]],
    seq_length: usize,
    device: &B::Device,
) -> Tensor<B, 2, Int> {
    let batch_size = rows.len();

    let mut values: Vec<B::IntElem> = Vec::with_capacity(batch_size * seq_length);

    for row in rows {
        values.extend(row.iter().take(seq_length).map(|v| (*v as i64).elem::<B::IntElem>()));

        let missing = seq_length.saturating_sub(row.len());
        values.extend(std::iter::repeat((pad_value as i64).elem::<B::IntElem>()).take(missing));
    }

    Tensor::from_data(
        Data::<B::IntElem, 2>::new(values, Shape::new([batch_size, seq_length])),
        device,
    )
}

/// Build a 1D integer tensor, typically class ids
pub fn int_vector<B: Backend>(values: &[usize], device: &B::Device) -> Tensor<B, 1, Int> {
    let data: Vec<B::IntElem> = values.iter().map(|v| (*v as i64).elem()).collect();

    Tensor::from_data(
        Data::<B::IntElem, 1>::new(data, Shape::new([values.len()])),
        device,
    )
}

#[cfg(test)]
mod tests {
    use burn::backend::NdArray;
    use pretty_assertions::assert_eq;

    use super::*;

    type B = NdArray;

    #[test]
    fn pads_and_truncates_rows() {
        let device = Default::default();
        let rows: [&[u32]; 2] = [&[5, 6], &[7, 8, 9, 10]];

        let tensor = pad_to::<B>(0, &rows, 3, &device);

        assert_eq!(tensor.dims(), [2, 3]);
        assert_eq!(
            tensor.into_data().convert::<i64>().value,
            vec![5, 6, 0, 7, 8, 9]
        );
    }

    #[test]
    fn builds_class_id_vectors() {
        let device = Default::default();

        let tensor = int_vector::<B>(&[3, 0, 1], &device);

        assert_eq!(tensor.into_data().convert::<i64>().value, vec![3, 0, 1]);
    }
}
