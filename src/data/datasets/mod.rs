//! 内置数据集

mod mnist;

pub use mnist::{
    MNIST_CLASSES, MNIST_MEAN, MNIST_MIRRORS, MNIST_STD, MnistDataset, default_data_dir,
};
