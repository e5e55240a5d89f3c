mod softmax_cross_entropy;

pub(in crate::nn) use softmax_cross_entropy::SoftmaxCrossEntropy;
