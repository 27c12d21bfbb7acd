mod tensor;
mod univariate;
