mod add;
mod avg_pool2d;
mod channel_bias_add;
mod conv2d;
mod flatten;
mod fuzzy_pool2d;
mod mat_mul;
mod max_pool2d;
mod membership_penalty;

pub(in crate::nn) use add::Add;
pub(in crate::nn) use avg_pool2d::AvgPool2d;
pub(in crate::nn) use channel_bias_add::ChannelBiasAdd;
pub(in crate::nn) use conv2d::Conv2d;
pub(in crate::nn) use flatten::Flatten;
pub(in crate::nn) use fuzzy_pool2d::FuzzyPool2d;
pub(in crate::nn) use mat_mul::MatMul;
pub(in crate::nn) use max_pool2d::MaxPool2d;
pub(in crate::nn) use membership_penalty::MembershipPenalty;
